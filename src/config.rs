//! Configuration management for the `WeatherPH` service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherPhError;
use crate::advisory::NoMatchPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `WeatherPH` service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherPhConfig {
    /// OpenWeather API configuration
    pub openweather: OpenWeatherConfig,
    /// Geocoding preferences
    pub geocoding: GeocodingConfig,
    /// Advisory derivation settings
    pub advisory: AdvisoryConfig,
    /// Geocode cache configuration
    pub cache: CacheConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Official (PAGASA) advisory source
    pub official: OfficialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// OpenWeather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    /// OpenWeather API key (`appid`)
    pub api_key: Option<String>,
    /// Base URL shared by the geocoding and weather endpoints
    pub base_url: String,
    /// Timeout for a single HTTP attempt in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

/// Geocoding preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// ISO 3166-1 alpha-2 code of the target country
    pub country_code: String,
    /// Full name of the target country, as some providers report it
    pub country_name: String,
    /// Number of candidates requested by the unconstrained fallback search
    pub fallback_limit: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// What to report when no condition rule matches
    pub on_no_match: NoMatchPolicy,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether geocoding results are cached at all
    pub enabled: bool,
    /// Cache TTL in hours
    pub ttl_hours: u32,
    /// Cache directory location
    pub location: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one side of a route lookup (geocode plus weather)
    pub lookup_timeout_seconds: u32,
    /// Optional directory served for non-API paths
    pub static_dir: Option<String>,
    /// PEM certificate, enables TLS together with `tls_key`
    pub tls_cert: Option<String>,
    /// PEM private key
    pub tls_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficialConfig {
    /// Page listing the current PAGASA weather advisories
    pub advisory_url: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint; trace export is off when unset
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_openweather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_openweather_timeout() -> u32 {
    8
}

fn default_openweather_max_retries() -> u32 {
    2
}

fn default_country_code() -> String {
    "PH".to_string()
}

fn default_country_name() -> String {
    "Philippines".to_string()
}

fn default_fallback_limit() -> u8 {
    5
}

fn default_cache_ttl() -> u32 {
    24
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("weatherph"))
        .unwrap_or_else(|| PathBuf::from(".weatherph-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_lookup_timeout() -> u32 {
    20
}

fn default_advisory_url() -> String {
    "https://www.pagasa.dost.gov.ph/weather/weather-advisory".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openweather_base_url(),
            timeout_seconds: default_openweather_timeout(),
            max_retries: default_openweather_max_retries(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            country_name: default_country_name(),
            fallback_limit: default_fallback_limit(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            lookup_timeout_seconds: default_lookup_timeout(),
            static_dir: None,
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl Default for OfficialConfig {
    fn default() -> Self {
        Self {
            advisory_url: default_advisory_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl OpenWeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl ServerConfig {
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_seconds.into())
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.ttl_hours) * 60 * 60)
    }
}

impl WeatherPhConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // WEATHERPH_OPENWEATHER__API_KEY -> openweather.api_key
        builder = builder.add_source(
            Environment::with_prefix("WEATHERPH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherPhConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherph").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.openweather.base_url.is_empty() {
            self.openweather.base_url = default_openweather_base_url();
        }
        if self.openweather.timeout_seconds == 0 {
            self.openweather.timeout_seconds = default_openweather_timeout();
        }
        if self.geocoding.country_code.is_empty() {
            self.geocoding.country_code = default_country_code();
        }
        if self.geocoding.country_name.is_empty() {
            self.geocoding.country_name = default_country_name();
        }
        if self.geocoding.fallback_limit == 0 {
            self.geocoding.fallback_limit = default_fallback_limit();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.server.lookup_timeout_seconds == 0 {
            self.server.lookup_timeout_seconds = default_lookup_timeout();
        }
        if self.official.advisory_url.is_empty() {
            self.official.advisory_url = default_advisory_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // A missing key is tolerated here; lookups then degrade to unavailable observations.
        if let Some(api_key) = &self.openweather.api_key {
            if api_key.is_empty() {
                return Err(WeatherPhError::config(
                    "OpenWeather API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(WeatherPhError::config(
                    "OpenWeather API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }

            if api_key.len() > 100 {
                return Err(WeatherPhError::config(
                    "OpenWeather API key appears to be invalid (too long). Please check your API key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.openweather.timeout_seconds > 60 {
            return Err(
                WeatherPhError::config("OpenWeather timeout cannot exceed 60 seconds").into(),
            );
        }

        if self.openweather.max_retries > 10 {
            return Err(WeatherPhError::config("OpenWeather max retries cannot exceed 10").into());
        }

        if self.geocoding.fallback_limit > 5 {
            return Err(
                WeatherPhError::config("Geocoding fallback limit cannot exceed 5 candidates").into(),
            );
        }

        if self.cache.ttl_hours > 168 {
            return Err(
                WeatherPhError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        if self.server.lookup_timeout_seconds > 120 {
            return Err(
                WeatherPhError::config("Lookup timeout cannot exceed 120 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherPhError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherPhError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.geocoding.country_code.len() != 2 {
            return Err(WeatherPhError::config(format!(
                "Country code '{}' must be an ISO 3166-1 alpha-2 code",
                self.geocoding.country_code
            ))
            .into());
        }

        for (name, url) in [
            ("OpenWeather base URL", &self.openweather.base_url),
            ("Official advisory URL", &self.official.advisory_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherPhError::config(format!(
                    "{name} must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(WeatherPhError::config(
                "TLS needs both server.tls_cert and server.tls_key",
            )
            .into());
        }

        Ok(())
    }
}
