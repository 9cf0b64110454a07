//! Weather retrieval
//!
//! The fetcher never fails: transport errors, bad statuses and in-body
//! error codes all come back as unavailable observations.

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::advisory::AdvisoryDeriver;
use crate::api_client::OpenWeatherClient;
use crate::models::{Coordinate, ForecastObservation, WeatherObservation};

pub mod openweather;

pub const FETCH_FAILED: &str = "Weather data for this point is currently unavailable.";
pub const FORECAST_FETCH_FAILED: &str = "Forecast data for this point is currently unavailable.";

/// Source of observations for a coordinate
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self, coordinate: Coordinate) -> WeatherObservation;

    async fn forecast(&self, coordinate: Coordinate) -> ForecastObservation;
}

/// OpenWeather-backed [`WeatherSource`]
#[derive(Clone)]
pub struct WeatherFetcher {
    client: OpenWeatherClient,
    deriver: AdvisoryDeriver,
}

impl WeatherFetcher {
    pub fn new(client: OpenWeatherClient, deriver: AdvisoryDeriver) -> Self {
        Self { client, deriver }
    }
}

#[async_trait]
impl WeatherSource for WeatherFetcher {
    #[instrument(skip(self))]
    async fn current_weather(&self, coordinate: Coordinate) -> WeatherObservation {
        match self.client.current_weather(coordinate).await {
            Ok(response) => response.into_observation(coordinate),
            Err(e) => {
                warn!("Current weather lookup failed: {}", e);
                WeatherObservation::unavailable(FETCH_FAILED)
            }
        }
    }

    #[instrument(skip(self))]
    async fn forecast(&self, coordinate: Coordinate) -> ForecastObservation {
        match self.client.forecast(coordinate).await {
            Ok(response) => response.into_observation(coordinate, &self.deriver),
            Err(e) => {
                warn!("Forecast lookup failed: {}", e);
                ForecastObservation::unavailable(FORECAST_FETCH_FAILED)
            }
        }
    }
}
