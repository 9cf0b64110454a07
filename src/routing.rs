//! Route weather assembly
//!
//! Looks up both ends of a trip concurrently and packages the observations
//! and advisories. Nothing here returns an error: every failure ends up as
//! an unavailable observation on the side it happened.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::advisory::{AdvisoryDeriver, AdvisoryPair};
use crate::location_resolver::{LocationParser, LocationResolver};
use crate::models::{Coordinate, ForecastObservation, RouteWeatherResult, WeatherObservation};
use crate::weather::WeatherSource;

pub const LOOKUP_TIMED_OUT: &str = "Weather lookup timed out. Please try again later.";

/// Weather and advisories for one named place
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceWeather {
    pub place: String,
    pub coordinate: Option<Coordinate>,
    pub weather: WeatherObservation,
    pub advisory: AdvisoryPair,
}

/// What one side of the trip resolved to
#[derive(Debug, Clone, PartialEq)]
struct SideLookup {
    coordinate: Option<Coordinate>,
    weather: WeatherObservation,
}

pub struct RouteWeatherService {
    resolver: Arc<LocationResolver>,
    weather: Arc<dyn WeatherSource>,
    deriver: AdvisoryDeriver,
    lookup_timeout: Duration,
}

impl RouteWeatherService {
    pub fn new(
        resolver: Arc<LocationResolver>,
        weather: Arc<dyn WeatherSource>,
        deriver: AdvisoryDeriver,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            weather,
            deriver,
            lookup_timeout,
        }
    }

    /// Weather and advisories for an origin and a destination.
    ///
    /// Supplied coordinates skip geocoding for their side; out-of-range
    /// ones are ignored and the place text is geocoded instead.
    #[instrument(skip(self))]
    pub async fn build_route_weather_result(
        &self,
        origin: &str,
        destination: &str,
        origin_coordinate: Option<Coordinate>,
        destination_coordinate: Option<Coordinate>,
    ) -> RouteWeatherResult {
        let (origin_side, destination_side) = join(
            self.lookup_side(origin, origin_coordinate),
            self.lookup_side(destination, destination_coordinate),
        )
        .await;

        let distance_km = match (origin_side.coordinate, destination_side.coordinate) {
            (Some(from), Some(to)) => Some(from.distance_km(&to)),
            _ => None,
        };

        let result = RouteWeatherResult {
            origin: origin.to_string(),
            destination: destination.to_string(),
            origin_advisory: self.deriver.derive(&origin_side.weather),
            destination_advisory: self.deriver.derive(&destination_side.weather),
            origin_weather: origin_side.weather,
            destination_weather: destination_side.weather,
            origin_coordinate: origin_side.coordinate,
            destination_coordinate: destination_side.coordinate,
            distance_km,
        };

        if result.is_partial() {
            warn!("Route lookup completed with missing weather data");
        } else {
            info!("Route lookup completed");
        }

        result
    }

    /// Geocode a place and look up its current weather
    #[instrument(skip(self))]
    pub async fn place_weather(&self, place: &str) -> PlaceWeather {
        let side = self.lookup_side(place, None).await;
        PlaceWeather {
            place: place.to_string(),
            coordinate: side.coordinate,
            advisory: self.deriver.derive(&side.weather),
            weather: side.weather,
        }
    }

    /// Current weather and advisories for a single point
    #[instrument(skip(self))]
    pub async fn local_weather(&self, coordinate: Coordinate) -> (WeatherObservation, AdvisoryPair) {
        let weather = match tokio::time::timeout(
            self.lookup_timeout,
            self.weather.current_weather(coordinate),
        )
        .await
        {
            Ok(weather) => weather,
            Err(_) => WeatherObservation::unavailable(LOOKUP_TIMED_OUT),
        };
        let advisory = self.deriver.derive(&weather);
        (weather, advisory)
    }

    /// 5-day forecast for a place, or for a supplied coordinate
    #[instrument(skip(self))]
    pub async fn forecast(&self, place: &str, coordinate: Option<Coordinate>) -> ForecastObservation {
        let lookup = async {
            let coordinate = match self.resolve(place, coordinate).await {
                Ok((coordinate, _)) => coordinate,
                Err(error) => return ForecastObservation::unavailable(error),
            };
            self.weather.forecast(coordinate).await
        };

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(forecast) => forecast,
            Err(_) => ForecastObservation::unavailable(LOOKUP_TIMED_OUT),
        }
    }

    /// Use the supplied coordinate when it is in range, geocode otherwise.
    /// The name is only set when the place text was geocoded.
    async fn resolve(
        &self,
        place: &str,
        supplied: Option<Coordinate>,
    ) -> Result<(Coordinate, Option<String>), String> {
        if let Some(coordinate) = supplied {
            if coordinate.is_valid() {
                return Ok((coordinate, None));
            }
            warn!("Ignoring out-of-range coordinate {:?} for '{}'", coordinate, place);
        }

        let location = self.resolver.geocode(place).await.map_err(|e| e.to_string())?;
        let name = LocationParser::parse_coordinates(place)
            .is_none()
            .then(|| location.name.clone());
        Ok((location.coordinate(), name))
    }

    async fn lookup_side(&self, place: &str, supplied: Option<Coordinate>) -> SideLookup {
        let known = supplied.filter(Coordinate::is_valid);

        let lookup = async {
            match self.resolve(place, supplied).await {
                Ok((coordinate, name)) => {
                    let mut weather = self.weather.current_weather(coordinate).await;
                    if let (Some(name), WeatherObservation::Available(conditions)) =
                        (name, &mut weather)
                    {
                        conditions.resolved_location_name = Some(name);
                    }
                    SideLookup {
                        coordinate: Some(coordinate),
                        weather,
                    }
                }
                Err(error) => SideLookup {
                    coordinate: None,
                    weather: WeatherObservation::unavailable(error),
                },
            }
        };

        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(side) => side,
            Err(_) => {
                warn!("Lookup for '{}' exceeded {:?}", place, self.lookup_timeout);
                SideLookup {
                    coordinate: known,
                    weather: WeatherObservation::unavailable(LOOKUP_TIMED_OUT),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use crate::advisory::{ConditionAdvisory, TemperatureAdvisory, UNAVAILABLE_ADVISORY};
    use crate::api_client::GeocodingResult;
    use crate::config::GeocodingConfig;
    use crate::location_resolver::GeocodingProvider;
    use crate::models::Conditions;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct OneCityProvider;

    #[async_trait]
    impl GeocodingProvider for OneCityProvider {
        async fn search(&self, query: &str, _limit: u8) -> Result<Vec<GeocodingResult>> {
            if query.starts_with("cebu") {
                Ok(vec![GeocodingResult {
                    name: "Cebu City".to_string(),
                    lat: 10.3157,
                    lon: 123.8854,
                    country: "PH".to_string(),
                    state: None,
                }])
            } else if query.starts_with("baguio") {
                Ok(vec![GeocodingResult {
                    name: "Baguio".to_string(),
                    lat: 16.4119905,
                    lon: 120.5933719,
                    country: "PH".to_string(),
                    state: Some("Benguet".to_string()),
                }])
            } else {
                Ok(Vec::new())
            }
        }
    }

    /// Rain everywhere except at the coordinates listed as broken
    struct FakeWeather {
        broken: Vec<Coordinate>,
        delay: Duration,
        requested: Mutex<Vec<Coordinate>>,
    }

    impl FakeWeather {
        fn new() -> Self {
            Self {
                broken: Vec::new(),
                delay: Duration::ZERO,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WeatherSource for FakeWeather {
        async fn current_weather(&self, coordinate: Coordinate) -> WeatherObservation {
            self.requested.lock().unwrap().push(coordinate);
            tokio::time::sleep(self.delay).await;
            if self.broken.contains(&coordinate) {
                return WeatherObservation::unavailable("Weather unavailable for this location.");
            }
            WeatherObservation::Available(Conditions {
                condition_main: "Rain".to_string(),
                condition_description: "heavy intensity rain".to_string(),
                temperature_celsius: Some(30.0),
                humidity_percent: Some(88),
                wind_speed_ms: Some(6.0),
                sunrise: None,
                sunset: None,
                utc_offset_seconds: Some(28_800),
                resolved_location_name: Some("Poblacion".to_string()),
                coordinate,
            })
        }

        async fn forecast(&self, _coordinate: Coordinate) -> ForecastObservation {
            ForecastObservation::unavailable("not scripted")
        }
    }

    fn service(weather: Arc<FakeWeather>) -> RouteWeatherService {
        let resolver = LocationResolver::new(Arc::new(OneCityProvider), &GeocodingConfig::default());
        RouteWeatherService::new(
            Arc::new(resolver),
            weather,
            AdvisoryDeriver::default(),
            Duration::from_secs(5),
        )
    }

    const MANILA: Coordinate = Coordinate {
        latitude: 14.5995,
        longitude: 120.9842,
    };

    #[tokio::test]
    async fn test_full_route() {
        let weather = Arc::new(FakeWeather::new());
        let result = service(weather.clone())
            .build_route_weather_result("Manila", "Cebu", Some(MANILA), None)
            .await;

        assert_eq!(result.origin, "Manila");
        assert_eq!(result.origin_coordinate, Some(MANILA));
        assert_eq!(
            result.destination_coordinate,
            Some(Coordinate::new(10.3157, 123.8854))
        );
        assert_eq!(
            result.origin_advisory.weather_advisory.as_deref(),
            Some(ConditionAdvisory::HeavyRain.message())
        );
        assert_eq!(
            result.destination_advisory.temperature_advisory.as_deref(),
            Some(TemperatureAdvisory::Warm.message())
        );
        assert!(result.distance_km.is_some());
        assert!(!result.is_partial());
        assert_eq!(weather.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_destination_keeps_origin() {
        let result = service(Arc::new(FakeWeather::new()))
            .build_route_weather_result("Manila", "Atlantis", Some(MANILA), None)
            .await;

        assert!(result.origin_weather.is_available());
        assert_eq!(
            result.destination_weather.error(),
            Some("Location not found in the Philippines: Atlantis")
        );
        assert_eq!(
            result.destination_advisory,
            AdvisoryPair {
                weather_advisory: Some(UNAVAILABLE_ADVISORY.to_string()),
                temperature_advisory: None,
            }
        );
        assert!(result.destination_coordinate.is_none());
        assert!(result.distance_km.is_none());
        assert!(result.is_partial());
    }

    #[tokio::test]
    async fn test_failed_fetch_still_builds_result() {
        let mut weather = FakeWeather::new();
        weather.broken.push(MANILA);
        let result = service(Arc::new(weather))
            .build_route_weather_result("Manila", "Cebu", Some(MANILA), None)
            .await;

        assert!(!result.origin_weather.is_available());
        assert_eq!(
            result.origin_advisory.weather_advisory.as_deref(),
            Some(UNAVAILABLE_ADVISORY)
        );
        assert!(result.destination_weather.is_available());
        assert_eq!(result.origin_coordinate, Some(MANILA));
    }

    #[tokio::test]
    async fn test_out_of_range_coordinate_is_geocoded() {
        let weather = Arc::new(FakeWeather::new());
        let result = service(weather.clone())
            .build_route_weather_result(
                "Cebu",
                "Manila",
                Some(Coordinate::new(123.0, 10.0)),
                Some(MANILA),
            )
            .await;

        assert_eq!(
            result.origin_coordinate,
            Some(Coordinate::new(10.3157, 123.8854))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_side_times_out() {
        let mut weather = FakeWeather::new();
        weather.delay = Duration::from_secs(60);
        let result = service(Arc::new(weather))
            .build_route_weather_result("Manila", "Cebu", Some(MANILA), None)
            .await;

        assert_eq!(result.origin_weather.error(), Some(LOOKUP_TIMED_OUT));
        assert_eq!(result.origin_coordinate, Some(MANILA));
        assert_eq!(result.destination_weather.error(), Some(LOOKUP_TIMED_OUT));
        assert!(result.destination_coordinate.is_none());
    }

    #[tokio::test]
    async fn test_place_weather() {
        let found = service(Arc::new(FakeWeather::new()))
            .place_weather("Cebu")
            .await;
        assert_eq!(found.coordinate, Some(Coordinate::new(10.3157, 123.8854)));
        assert!(found.weather.is_available());

        let missing = service(Arc::new(FakeWeather::new()))
            .place_weather("Atlantis")
            .await;
        assert!(missing.coordinate.is_none());
        assert_eq!(
            missing.advisory.weather_advisory.as_deref(),
            Some(UNAVAILABLE_ADVISORY)
        );
    }

    #[tokio::test]
    async fn test_local_weather_carries_advisory() {
        let (weather, advisory) = service(Arc::new(FakeWeather::new()))
            .local_weather(MANILA)
            .await;

        assert!(weather.is_available());
        assert_eq!(
            advisory.weather_advisory.as_deref(),
            Some(ConditionAdvisory::HeavyRain.message())
        );
    }

    #[tokio::test]
    async fn test_geocoded_name_replaces_station_name() {
        let result = service(Arc::new(FakeWeather::new()))
            .build_route_weather_result("Baguio", "Manila", None, Some(MANILA))
            .await;

        let origin = result.origin_weather.conditions().unwrap();
        assert_eq!(origin.resolved_location_name.as_deref(), Some("Baguio, Benguet"));

        let destination = result.destination_weather.conditions().unwrap();
        assert_eq!(destination.resolved_location_name.as_deref(), Some("Poblacion"));
    }

    #[tokio::test]
    async fn test_coordinate_literal_keeps_station_name() {
        let found = service(Arc::new(FakeWeather::new()))
            .place_weather("14.5995, 120.9842")
            .await;

        assert_eq!(found.coordinate, Some(MANILA));
        assert_eq!(
            found.weather.conditions().unwrap().resolved_location_name.as_deref(),
            Some("Poblacion")
        );
    }
}
