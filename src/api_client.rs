//! OpenWeather API client
//!
//! Shared HTTP plumbing for the geocoding, current weather and forecast
//! endpoints: per-attempt timeouts, retries with exponential backoff for
//! transient failures, and status code mapping.

use std::time::Instant;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::OpenWeatherConfig;
use crate::models::{Coordinate, Location};
use crate::weather::openweather::{CurrentWeatherResponse, ForecastResponse};
use crate::{Result, WeatherPhError};

const USER_AGENT: &str = concat!("WeatherPH/", env!("CARGO_PKG_VERSION"));

/// Build the retrying HTTP client shared by every outbound call
pub fn build_http_client(config: &OpenWeatherConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| WeatherPhError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Client for the OpenWeather geocoding and weather APIs
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client. A missing API key is accepted; every call then
    /// fails with an authentication error from the provider.
    pub fn new(config: &OpenWeatherConfig) -> Result<Self> {
        Ok(Self::with_http_client(build_http_client(config)?, config))
    }

    pub fn with_http_client(http: ClientWithMiddleware, config: &OpenWeatherConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
        }
    }

    /// Direct geocoding: `/geo/1.0/direct?q=<query>&limit=<limit>`
    #[instrument(skip(self))]
    pub async fn direct_geocode(&self, query: &str, limit: u8) -> Result<Vec<GeocodingResult>> {
        let url = format!(
            "{}/geo/1.0/direct?q={}&limit={}&appid={}",
            self.base_url,
            urlencoding::encode(query),
            limit,
            self.api_key
        );

        let results: Vec<GeocodingResult> = self.get_json(&url).await?;

        if results.is_empty() {
            debug!("No geocoding candidates for '{}'", query);
        } else {
            debug!(
                "Geocoding candidates: {:?}",
                results
                    .iter()
                    .map(|r| format!("{} [{}] ({:.4}, {:.4})", r.name, r.country, r.lat, r.lon))
                    .collect::<Vec<_>>()
            );
        }

        Ok(results)
    }

    /// Current weather in metric units: `/data/2.5/weather`
    #[instrument(skip(self))]
    pub async fn current_weather(&self, coordinate: Coordinate) -> Result<CurrentWeatherResponse> {
        let url = format!(
            "{}/data/2.5/weather?lat={}&lon={}&units=metric&appid={}",
            self.base_url, coordinate.latitude, coordinate.longitude, self.api_key
        );
        self.get_json(&url).await
    }

    /// 5-day / 3-hour forecast in metric units: `/data/2.5/forecast`
    #[instrument(skip(self))]
    pub async fn forecast(&self, coordinate: Coordinate) -> Result<ForecastResponse> {
        let url = format!(
            "{}/data/2.5/forecast?lat={}&lon={}&units=metric&appid={}",
            self.base_url, coordinate.latitude, coordinate.longitude, self.api_key
        );
        self.get_json(&url).await
    }

    /// GET a JSON document, mapping non-success statuses to errors
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start_time = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();

        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        match status.as_u16() {
            200..=299 => {}
            401 => {
                warn!("OpenWeather rejected the API key (HTTP 401)");
                return Err(WeatherPhError::api(
                    "Invalid API key. Please check your OpenWeather API key.",
                ));
            }
            404 => {
                return Err(WeatherPhError::not_found(
                    "Location not found. Please check the coordinates or location name.",
                ));
            }
            429 => {
                warn!("OpenWeather rate limit exceeded (HTTP 429)");
                return Err(WeatherPhError::api(
                    "Rate limit exceeded and retry attempts exhausted.",
                ));
            }
            _ => {
                return Err(WeatherPhError::api(format!(
                    "API request failed with status: {} - {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown error")
                )));
            }
        }

        let body = response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse OpenWeather response: {}", e);
            WeatherPhError::api(format!("Invalid data received from OpenWeather: {e}"))
        })?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        } else {
            info!(
                "Successful API request in {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(body)
    }
}

/// Geocoding candidate from OpenWeather (or any provider with the same shape)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeocodingResult {
    /// Location name
    pub name: String,
    /// Latitude; providers send it as a number or as a string
    #[serde(deserialize_with = "number_or_string")]
    pub lat: f64,
    /// Longitude; providers send it as a number or as a string
    #[serde(deserialize_with = "number_or_string")]
    pub lon: f64,
    /// Country code or full country name
    #[serde(default)]
    pub country: String,
    /// Province or region
    pub state: Option<String>,
}

impl GeocodingResult {
    /// Whether the candidate lies in the given country, by code or by name
    #[must_use]
    pub fn is_in_country(&self, country_code: &str, country_name: &str) -> bool {
        self.country.eq_ignore_ascii_case(country_code)
            || self.country.eq_ignore_ascii_case(country_name)
    }
}

impl From<GeocodingResult> for Location {
    fn from(geocoding: GeocodingResult) -> Self {
        let name = if let Some(state) = geocoding.state {
            format!("{}, {}", geocoding.name, state)
        } else {
            geocoding.name
        };

        Location::with_country(geocoding.lat, geocoding.lon, name, geocoding.country)
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::String(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
