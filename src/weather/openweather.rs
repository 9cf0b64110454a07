//! OpenWeather response structures and conversion to observations
//!
//! Every field is optional: a payload missing data becomes an observation
//! with absent fields rather than a parse failure.

use serde::Deserialize;
use serde_json::Value;

use crate::advisory::AdvisoryDeriver;
use crate::models::{Conditions, Coordinate, ForecastObservation, ForecastSlot, WeatherObservation};

pub const WEATHER_UNAVAILABLE: &str = "Weather unavailable for this location.";
pub const FORECAST_UNAVAILABLE: &str = "Forecast unavailable for this location.";

/// Current weather response from `/data/2.5/weather`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CurrentWeatherResponse {
    pub weather: Vec<ConditionEntry>,
    pub main: Option<MainReadings>,
    pub wind: Option<WindReadings>,
    pub sys: Option<SysInfo>,
    /// Shift from UTC in seconds
    pub timezone: Option<i32>,
    pub name: Option<String>,
    /// Status echoed in the body; a number on success, often a string on failure
    pub cod: Option<Value>,
    pub message: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConditionEntry {
    pub main: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MainReadings {
    pub temp: Option<f64>,
    pub humidity: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WindReadings {
    pub speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SysInfo {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// 5-day / 3-hour forecast response from `/data/2.5/forecast`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForecastResponse {
    pub cod: Option<Value>,
    pub list: Vec<ForecastEntry>,
    pub city: Option<CityInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: Option<MainReadings>,
    pub weather: Vec<ConditionEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CityInfo {
    pub name: Option<String>,
    pub timezone: Option<i32>,
}

/// `cod` is 200 (or "200"), or absent altogether
fn is_success_code(cod: Option<&Value>) -> bool {
    match cod {
        None => true,
        Some(Value::Number(n)) => n.as_u64() == Some(200),
        Some(Value::String(s)) => s.trim() == "200",
        Some(_) => false,
    }
}

/// First entry's group and description; empty strings when absent
fn first_condition(entries: &[ConditionEntry]) -> (String, String) {
    entries
        .first()
        .map(|entry| {
            (
                entry.main.clone().unwrap_or_default(),
                entry.description.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

fn temperature(main: Option<&MainReadings>) -> Option<f64> {
    main.and_then(|m| m.temp).filter(|t| !t.is_nan())
}

impl CurrentWeatherResponse {
    /// Convert to an observation for the requested coordinate
    #[must_use]
    pub fn into_observation(self, coordinate: Coordinate) -> WeatherObservation {
        if !is_success_code(self.cod.as_ref()) {
            tracing::warn!(
                "OpenWeather reported status {:?} in body: {:?}",
                self.cod,
                self.message
            );
            return WeatherObservation::unavailable(WEATHER_UNAVAILABLE);
        }

        let (condition_main, condition_description) = first_condition(&self.weather);

        WeatherObservation::Available(Conditions {
            condition_main,
            condition_description,
            temperature_celsius: temperature(self.main.as_ref()),
            humidity_percent: self.main.as_ref().and_then(|m| m.humidity),
            wind_speed_ms: self.wind.and_then(|w| w.speed),
            sunrise: self.sys.as_ref().and_then(|s| s.sunrise),
            sunset: self.sys.as_ref().and_then(|s| s.sunset),
            utc_offset_seconds: self.timezone,
            resolved_location_name: self.name.filter(|n| !n.is_empty()),
            coordinate,
        })
    }
}

impl ForecastResponse {
    /// Convert to a forecast observation, deriving advisories per slot
    #[must_use]
    pub fn into_observation(
        self,
        coordinate: Coordinate,
        deriver: &AdvisoryDeriver,
    ) -> ForecastObservation {
        if !is_success_code(self.cod.as_ref()) {
            tracing::warn!("OpenWeather forecast reported status {:?}", self.cod);
            return ForecastObservation::unavailable(FORECAST_UNAVAILABLE);
        }

        let slots = self
            .list
            .into_iter()
            .map(|entry| {
                let (condition_main, condition_description) = first_condition(&entry.weather);
                let temperature_celsius = temperature(entry.main.as_ref());
                let advisory =
                    deriver.derive_for(&condition_main, &condition_description, temperature_celsius);
                ForecastSlot {
                    timestamp: entry.dt,
                    condition_main,
                    condition_description,
                    temperature_celsius,
                    advisory,
                }
            })
            .collect();

        let (city_name, utc_offset_seconds) = match self.city {
            Some(city) => (city.name, city.timezone),
            None => (None, None),
        };

        ForecastObservation::Available {
            city_name,
            utc_offset_seconds,
            coordinate,
            slots,
        }
    }
}
