//! Error types and handling for the `WeatherPH` service

use thiserror::Error;

/// Main error type for the `WeatherPH` service
#[derive(Error, Debug)]
pub enum WeatherPhError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A lookup that completed but matched nothing
    #[error("Not found: {message}")]
    NotFound { message: String },
}

impl WeatherPhError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message. Never includes upstream error chains.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherPhError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            WeatherPhError::Api { .. } => {
                "Unable to reach the weather services right now. Please try again later."
                    .to_string()
            }
            WeatherPhError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WeatherPhError::NotFound { message } => message.clone(),
        }
    }
}

impl From<reqwest_middleware::Error> for WeatherPhError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::api(err.to_string())
    }
}

impl From<reqwest::Error> for WeatherPhError {
    fn from(err: reqwest::Error) -> Self {
        Self::api(err.to_string())
    }
}

/// Geocoding failure, returned as a value so callers can degrade gracefully
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("Location not found in {country}: {place}")]
    NotFound { place: String, country: String },

    #[error("Could not connect to geocoding service. {0}")]
    Upstream(String),
}
