//! Travel advisory derivation
//!
//! Maps a weather observation to a pair of human-readable advisories: one
//! driven by the reported condition, one driven by the temperature. Both
//! are evaluated against ordered rule tables where the first match wins,
//! so the order of [`CONDITION_RULES`] and [`TEMPERATURE_BANDS`] is part of
//! the behavior.

use serde::{Deserialize, Serialize};

use crate::models::WeatherObservation;

/// Reported for an observation that carries an error instead of data
pub const UNAVAILABLE_ADVISORY: &str =
    "No live weather data. Please check your connection or try again later.";

/// Reported under [`NoMatchPolicy::Unavailable`] when no condition rule matches
pub const NO_MATCH_ADVISORY: &str = "Weather data is currently unavailable.";

/// Condition-based hazard advisories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionAdvisory {
    Overcast,
    PartlyCloudy,
    ScatteredClouds,
    MostlySunny,
    LightRain,
    ModerateRain,
    HeavyRain,
    ClearSky,
    Thunderstorm,
    Snow,
    LowVisibility,
    HighWind,
}

impl ConditionAdvisory {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Overcast => {
                "☁️ Overcast Skies: Visibility may be reduced. Ensure your vehicle's headlights are on for safety."
            }
            Self::PartlyCloudy => {
                "🌥️ Partly Cloudy: Expect intermittent sun. Conditions are generally excellent for travel."
            }
            Self::ScatteredClouds => {
                "⛅ Scattered Clouds: Mostly clear with good visibility. Travel conditions are ideal."
            }
            Self::MostlySunny => {
                "🌤️ Mostly Sunny: Excellent visibility and road conditions expected. A great day for travel."
            }
            Self::LightRain => {
                "🌦️ Light Rain Advisory: Roads may be slick. Activate wipers and increase your following distance."
            }
            Self::ModerateRain => {
                "🌧️ Moderate Rain Warning: Reduce speed significantly and use headlights. Be alert for localized flooding."
            }
            Self::HeavyRain => {
                "🌧️ Heavy Rain Warning: High risk of flash floods and zero visibility. It is strongly advised to postpone travel."
            }
            Self::ClearSky => {
                "🌞 Clear Skies: Ideal travel conditions. Stay aware of road traffic and hydrate, especially during long drives."
            }
            Self::Thunderstorm => {
                "⛈️ Thunderstorm Warning: Severe weather is active. High risk of lightning, flash floods, and strong winds. Do not travel."
            }
            Self::Snow => {
                "❄️ Snow/Sleet Advisory: Roads will be extremely slippery and visibility poor. Travel is not recommended unless essential."
            }
            Self::LowVisibility => {
                "🌫️ Low Visibility Warning: Dense fog or mist is present. Use low-beam headlights and fog lights, and reduce speed drastically."
            }
            Self::HighWind => {
                "💨 High Wind Advisory: Be cautious, especially with high-profile vehicles. Watch for falling debris and be prepared for sudden gusts."
            }
        }
    }
}

/// Temperature-based travel advisories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureAdvisory {
    ExtremeHeat,
    HeatCaution,
    Warm,
    Pleasant,
    Mild,
    Cool,
}

impl TemperatureAdvisory {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ExtremeHeat => {
                "🌡️ Danger - Extreme Heat: Heatstroke risk is high. Avoid non-essential travel and stay hydrated. Never leave people or pets in a vehicle."
            }
            Self::HeatCaution => {
                "☀️ Heat Caution: Risk of heat exhaustion. Drink plenty of water, wear light clothing, and take breaks in the shade."
            }
            Self::Warm => {
                "🌤️ Warm Weather: Conditions are pleasant. Ensure you have drinking water available for your journey."
            }
            Self::Pleasant => "😊 Pleasant Weather: Ideal temperature for travel. Enjoy the trip safely.",
            Self::Mild => "🌡️ Mild Temperature: Comfortable conditions for any travel plans.",
            Self::Cool => {
                "🧥 Cool Conditions: Temperatures are low. A jacket is recommended, particularly for night travel or trips to higher elevations."
            }
        }
    }
}

/// A single test against the lower-cased condition texts
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    DescriptionIs(&'static str),
    DescriptionHas(&'static str),
    ConditionHas(&'static str),
}

impl Matcher {
    fn matches(self, condition_main: &str, description: &str) -> bool {
        match self {
            Self::DescriptionIs(text) => description == text,
            Self::DescriptionHas(text) => description.contains(text),
            Self::ConditionHas(text) => condition_main.contains(text),
        }
    }
}

/// Fires when any of its matchers does
#[derive(Debug, Clone, Copy)]
pub struct ConditionRule {
    pub any_of: &'static [Matcher],
    pub advisory: ConditionAdvisory,
}

pub const CONDITION_RULES: &[ConditionRule] = &[
    ConditionRule {
        any_of: &[Matcher::DescriptionIs("overcast clouds")],
        advisory: ConditionAdvisory::Overcast,
    },
    ConditionRule {
        any_of: &[Matcher::DescriptionIs("broken clouds")],
        advisory: ConditionAdvisory::PartlyCloudy,
    },
    ConditionRule {
        any_of: &[Matcher::DescriptionIs("scattered clouds")],
        advisory: ConditionAdvisory::ScatteredClouds,
    },
    ConditionRule {
        any_of: &[Matcher::DescriptionIs("few clouds")],
        advisory: ConditionAdvisory::MostlySunny,
    },
    ConditionRule {
        any_of: &[Matcher::DescriptionHas("light rain")],
        advisory: ConditionAdvisory::LightRain,
    },
    ConditionRule {
        any_of: &[Matcher::DescriptionHas("moderate rain")],
        advisory: ConditionAdvisory::ModerateRain,
    },
    // OpenWeather reports "heavy intensity rain" and "very heavy rain"; neither
    // "extreme rain" nor "heavy intensity shower rain" counts.
    ConditionRule {
        any_of: &[
            Matcher::DescriptionHas("heavy intensity rain"),
            Matcher::DescriptionHas("very heavy rain"),
        ],
        advisory: ConditionAdvisory::HeavyRain,
    },
    ConditionRule {
        any_of: &[Matcher::DescriptionHas("clear sky")],
        advisory: ConditionAdvisory::ClearSky,
    },
    ConditionRule {
        any_of: &[Matcher::ConditionHas("thunderstorm")],
        advisory: ConditionAdvisory::Thunderstorm,
    },
    ConditionRule {
        any_of: &[Matcher::ConditionHas("snow")],
        advisory: ConditionAdvisory::Snow,
    },
    ConditionRule {
        any_of: &[
            Matcher::ConditionHas("fog"),
            Matcher::DescriptionHas("fog"),
            Matcher::ConditionHas("mist"),
        ],
        advisory: ConditionAdvisory::LowVisibility,
    },
    ConditionRule {
        any_of: &[Matcher::ConditionHas("wind")],
        advisory: ConditionAdvisory::HighWind,
    },
];

#[derive(Debug, Clone, Copy)]
pub enum Bound {
    AtLeast(f64),
    AtMost(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct TemperatureBand {
    pub bound: Bound,
    pub advisory: TemperatureAdvisory,
}

/// Nothing covers (12, 20): temperatures in that gap get no advisory.
pub const TEMPERATURE_BANDS: &[TemperatureBand] = &[
    TemperatureBand {
        bound: Bound::AtLeast(37.0),
        advisory: TemperatureAdvisory::ExtremeHeat,
    },
    TemperatureBand {
        bound: Bound::AtLeast(34.0),
        advisory: TemperatureAdvisory::HeatCaution,
    },
    TemperatureBand {
        bound: Bound::AtLeast(28.0),
        advisory: TemperatureAdvisory::Warm,
    },
    TemperatureBand {
        bound: Bound::AtLeast(24.0),
        advisory: TemperatureAdvisory::Pleasant,
    },
    TemperatureBand {
        bound: Bound::AtLeast(20.0),
        advisory: TemperatureAdvisory::Mild,
    },
    TemperatureBand {
        bound: Bound::AtMost(12.0),
        advisory: TemperatureAdvisory::Cool,
    },
];

/// Classify condition texts; case-insensitive
#[must_use]
pub fn classify_conditions(condition_main: &str, description: &str) -> Option<ConditionAdvisory> {
    let condition_main = condition_main.to_lowercase();
    let description = description.to_lowercase();

    CONDITION_RULES
        .iter()
        .find(|rule| {
            rule.any_of
                .iter()
                .any(|matcher| matcher.matches(&condition_main, &description))
        })
        .map(|rule| rule.advisory)
}

#[must_use]
pub fn classify_temperature(celsius: f64) -> Option<TemperatureAdvisory> {
    if celsius.is_nan() {
        return None;
    }

    TEMPERATURE_BANDS
        .iter()
        .find(|band| match band.bound {
            Bound::AtLeast(threshold) => celsius >= threshold,
            Bound::AtMost(threshold) => celsius <= threshold,
        })
        .map(|band| band.advisory)
}

/// What to report when no condition rule matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoMatchPolicy {
    /// Report [`NO_MATCH_ADVISORY`]
    #[default]
    Unavailable,
    /// Leave the weather advisory empty
    Omit,
}

/// The two advisories derived from one observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryPair {
    pub weather_advisory: Option<String>,
    pub temperature_advisory: Option<String>,
}

/// Pure mapping from observations to advisories
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisoryDeriver {
    on_no_match: NoMatchPolicy,
}

impl AdvisoryDeriver {
    #[must_use]
    pub fn new(on_no_match: NoMatchPolicy) -> Self {
        Self { on_no_match }
    }

    #[must_use]
    pub fn derive(&self, observation: &WeatherObservation) -> AdvisoryPair {
        match observation.conditions() {
            Some(conditions) => self.derive_for(
                &conditions.condition_main,
                &conditions.condition_description,
                conditions.temperature_celsius,
            ),
            None => AdvisoryPair {
                weather_advisory: Some(UNAVAILABLE_ADVISORY.to_string()),
                temperature_advisory: None,
            },
        }
    }

    /// Derive from raw fields, e.g. a forecast slot
    #[must_use]
    pub fn derive_for(
        &self,
        condition_main: &str,
        description: &str,
        temperature_celsius: Option<f64>,
    ) -> AdvisoryPair {
        let weather_advisory = match classify_conditions(condition_main, description) {
            Some(advisory) => Some(advisory.message().to_string()),
            None => match self.on_no_match {
                NoMatchPolicy::Unavailable => Some(NO_MATCH_ADVISORY.to_string()),
                NoMatchPolicy::Omit => None,
            },
        };

        let temperature_advisory = temperature_celsius
            .and_then(classify_temperature)
            .map(|advisory| advisory.message().to_string());

        AdvisoryPair {
            weather_advisory,
            temperature_advisory,
        }
    }
}

/// Derive advisories with the default no-match policy
#[must_use]
pub fn derive_advisory(observation: &WeatherObservation) -> AdvisoryPair {
    AdvisoryDeriver::default().derive(observation)
}
