//! Weather observation models handed to the advisory deriver and the presentation layer

use chrono::{DateTime, FixedOffset};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::location::Coordinate;
use crate::advisory::AdvisoryPair;

/// Current conditions at one coordinate.
///
/// Serializes with `local_sunrise` and `local_sunset` added as RFC 3339
/// times in the observed place's offset.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Conditions {
    /// Condition group, e.g. "Rain" or "Clouds"
    pub condition_main: String,
    /// Detailed condition, e.g. "light rain"
    pub condition_description: String,
    /// Temperature in Celsius; `None` when the provider left it out
    pub temperature_celsius: Option<f64>,
    /// Relative humidity in percent
    pub humidity_percent: Option<u8>,
    /// Wind speed in m/s
    pub wind_speed_ms: Option<f64>,
    /// Sunrise as a unix timestamp (seconds)
    pub sunrise: Option<i64>,
    /// Sunset as a unix timestamp (seconds)
    pub sunset: Option<i64>,
    /// Shift from UTC in seconds for the observed place
    pub utc_offset_seconds: Option<i32>,
    pub resolved_location_name: Option<String>,
    /// The coordinate the observation was requested for
    pub coordinate: Coordinate,
}

/// A single weather snapshot, or the reason none is available
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum WeatherObservation {
    Available(Conditions),
    Unavailable { error: String },
}

impl WeatherObservation {
    pub fn unavailable<S: Into<String>>(error: S) -> Self {
        Self::Unavailable {
            error: error.into(),
        }
    }

    #[must_use]
    pub fn conditions(&self) -> Option<&Conditions> {
        match self {
            Self::Available(conditions) => Some(conditions),
            Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { error } => Some(error),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl Conditions {
    fn local_time(&self, epoch_seconds: Option<i64>) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.utc_offset_seconds.unwrap_or(0))?;
        let utc = DateTime::from_timestamp(epoch_seconds?, 0)?;
        Some(utc.with_timezone(&offset))
    }

    /// Sunrise in the observed place's local time
    #[must_use]
    pub fn local_sunrise(&self) -> Option<DateTime<FixedOffset>> {
        self.local_time(self.sunrise)
    }

    /// Sunset in the observed place's local time
    #[must_use]
    pub fn local_sunset(&self) -> Option<DateTime<FixedOffset>> {
        self.local_time(self.sunset)
    }

}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Conditions", 12)?;
        state.serialize_field("condition_main", &self.condition_main)?;
        state.serialize_field("condition_description", &self.condition_description)?;
        state.serialize_field("temperature_celsius", &self.temperature_celsius)?;
        state.serialize_field("humidity_percent", &self.humidity_percent)?;
        state.serialize_field("wind_speed_ms", &self.wind_speed_ms)?;
        state.serialize_field("sunrise", &self.sunrise)?;
        state.serialize_field("sunset", &self.sunset)?;
        state.serialize_field("local_sunrise", &self.local_sunrise())?;
        state.serialize_field("local_sunset", &self.local_sunset())?;
        state.serialize_field("utc_offset_seconds", &self.utc_offset_seconds)?;
        state.serialize_field("resolved_location_name", &self.resolved_location_name)?;
        state.serialize_field("coordinate", &self.coordinate)?;
        state.end()
    }
}

/// One 3-hour slot of the 5-day forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastSlot {
    /// Start of the slot as a unix timestamp (seconds)
    pub timestamp: i64,
    pub condition_main: String,
    pub condition_description: String,
    pub temperature_celsius: Option<f64>,
    pub advisory: AdvisoryPair,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ForecastObservation {
    Available {
        city_name: Option<String>,
        utc_offset_seconds: Option<i32>,
        coordinate: Coordinate,
        slots: Vec<ForecastSlot>,
    },
    Unavailable {
        error: String,
    },
}

impl ForecastObservation {
    pub fn unavailable<S: Into<String>>(error: S) -> Self {
        Self::Unavailable {
            error: error.into(),
        }
    }
}
