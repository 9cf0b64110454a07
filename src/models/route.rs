//! The aggregate result of an origin/destination lookup

use serde::{Deserialize, Serialize};

use super::location::Coordinate;
use super::weather::WeatherObservation;
use crate::advisory::AdvisoryPair;

/// Weather and advisories for both ends of a trip
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteWeatherResult {
    /// Origin exactly as the user typed it
    pub origin: String,
    /// Destination exactly as the user typed it
    pub destination: String,
    pub origin_weather: WeatherObservation,
    pub destination_weather: WeatherObservation,
    pub origin_advisory: AdvisoryPair,
    pub destination_advisory: AdvisoryPair,
    pub origin_coordinate: Option<Coordinate>,
    pub destination_coordinate: Option<Coordinate>,
    /// Great-circle distance, known only when both coordinates are
    pub distance_km: Option<f64>,
}

impl RouteWeatherResult {
    /// True when at least one side has no weather data
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.origin_weather.is_available() || !self.destination_weather.is_available()
    }
}
