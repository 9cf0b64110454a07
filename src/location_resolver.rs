//! Location Resolution Module
//!
//! Turns free text into a [`Location`]. A literal "lat,lon" pair is parsed
//! locally; anything else goes through the geocoding provider, first
//! constrained to the target country and then as a broad search filtered
//! by country.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::api_client::{GeocodingResult, OpenWeatherClient};
use crate::cache::{self, PersistentCache};
use crate::config::GeocodingConfig;
use crate::error::GeocodeError;
use crate::models::{Coordinate, Location};

static COORDINATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?\d+(?:\.\d*)?)\s*,\s*([+-]?\d+(?:\.\d*)?)\s*$")
        .expect("coordinate pattern is a valid regex")
});

/// Parser for literal coordinate input
pub struct LocationParser;

impl LocationParser {
    /// Parse "lat,lon". Returns `None` for anything else, including pairs
    /// outside the valid latitude/longitude ranges.
    #[must_use]
    pub fn parse_coordinates(input: &str) -> Option<Coordinate> {
        let captures = COORDINATE_PATTERN.captures(input)?;
        let latitude: f64 = captures.get(1)?.as_str().parse().ok()?;
        let longitude: f64 = captures.get(2)?.as_str().parse().ok()?;

        let coordinate = Coordinate::new(latitude, longitude);
        if coordinate.is_valid() {
            Some(coordinate)
        } else {
            debug!("Coordinate literal out of range: {}", input.trim());
            None
        }
    }
}

/// Forward geocoding backend
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn search(&self, query: &str, limit: u8) -> Result<Vec<GeocodingResult>>;
}

#[async_trait]
impl GeocodingProvider for OpenWeatherClient {
    async fn search(&self, query: &str, limit: u8) -> Result<Vec<GeocodingResult>> {
        self.direct_geocode(query, limit).await
    }
}

/// Service for resolving place text into locations
pub struct LocationResolver {
    provider: Arc<dyn GeocodingProvider>,
    country_code: String,
    country_name: String,
    fallback_limit: u8,
    cache: Option<(PersistentCache, Duration)>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, config: &GeocodingConfig) -> Self {
        Self {
            provider,
            country_code: config.country_code.clone(),
            country_name: config.country_name.clone(),
            fallback_limit: config.fallback_limit,
            cache: None,
        }
    }

    /// Remember successful lookups for roughly `ttl`
    #[must_use]
    pub fn with_cache(mut self, cache: PersistentCache, ttl: Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    /// Resolve place text to a location
    #[instrument(skip(self))]
    pub async fn geocode(&self, place: &str) -> std::result::Result<Location, GeocodeError> {
        if let Some(coordinate) = LocationParser::parse_coordinates(place) {
            debug!("Using coordinate literal {:?}", coordinate);
            return Ok(Location::from_coordinate(coordinate));
        }

        let text = place.trim().to_lowercase();
        let cache_key = format!("geocode:{}:{}", self.country_code.to_lowercase(), text);

        if let Some(location) = self.cached(&cache_key).await {
            return Ok(location);
        }

        let location = self.search(&text).await?.ok_or_else(|| GeocodeError::NotFound {
            place: place.trim().to_string(),
            country: format!("the {}", self.country_name),
        })?;

        debug!(
            "Resolved '{}' to {} ({:.4}, {:.4})",
            text, location.name, location.latitude, location.longitude
        );

        self.remember(&cache_key, &location).await;
        Ok(location)
    }

    async fn search(&self, text: &str) -> std::result::Result<Option<Location>, GeocodeError> {
        let constrained = format!("{},{}", text, self.country_code);
        let results = self
            .provider
            .search(&constrained, 1)
            .await
            .map_err(|e| GeocodeError::Upstream(e.to_string()))?;

        if let Some(first) = results.into_iter().next() {
            return Ok(Some(Location::from(first)));
        }

        debug!("No country-constrained match for '{}', broadening", text);
        let results = self
            .provider
            .search(text, self.fallback_limit)
            .await
            .map_err(|e| GeocodeError::Upstream(e.to_string()))?;

        Ok(results
            .into_iter()
            .find(|r| r.is_in_country(&self.country_code, &self.country_name))
            .map(Location::from))
    }

    async fn cached(&self, key: &str) -> Option<Location> {
        let (cache, _) = self.cache.as_ref()?;
        match cache.get::<Location>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Geocode cache read failed: {}", e);
                None
            }
        }
    }

    async fn remember(&self, key: &str, location: &Location) {
        let Some((cache, ttl)) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = cache.put(key, location.clone(), cache::jittered(*ttl)).await {
            warn!("Geocode cache write failed: {}", e);
        }
    }
}
