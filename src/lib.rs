//! `WeatherPH` - Route weather lookups and travel advisories for the Philippines
//!
//! This library resolves an origin and a destination to coordinates, fetches
//! current conditions for both from OpenWeather, and derives hazard and
//! temperature advisories for travellers.

pub mod advisory;
pub mod api;
pub mod api_client;
pub mod cache;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod models;
pub mod official;
pub mod routing;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use advisory::{AdvisoryDeriver, AdvisoryPair, NoMatchPolicy, derive_advisory};
pub use api_client::{GeocodingResult, OpenWeatherClient};
pub use config::WeatherPhConfig;
pub use error::{GeocodeError, WeatherPhError};
pub use location_resolver::{GeocodingProvider, LocationParser, LocationResolver};
pub use models::{Coordinate, ForecastObservation, Location, RouteWeatherResult, WeatherObservation};
pub use routing::RouteWeatherService;
pub use weather::{WeatherFetcher, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherPhError>;
