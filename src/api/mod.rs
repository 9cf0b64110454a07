use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::advisory::{AdvisoryDeriver, AdvisoryPair};
use crate::api_client::{OpenWeatherClient, build_http_client};
use crate::cache::PersistentCache;
use crate::config::WeatherPhConfig;
use crate::location_resolver::LocationResolver;
use crate::models::{Coordinate, ForecastObservation, RouteWeatherResult, WeatherObservation};
use crate::official::OfficialAdvisories;
use crate::routing::RouteWeatherService;
use crate::weather::WeatherFetcher;
use crate::{VERSION, WeatherPhError};

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub route: Arc<RouteWeatherService>,
    pub official: Arc<OfficialAdvisories>,
}

impl AppState {
    /// Wire the services described by `config`. A cache that cannot be
    /// opened is skipped with a warning.
    pub fn from_config(config: &WeatherPhConfig) -> crate::Result<Self> {
        let http = build_http_client(&config.openweather)?;
        let client = OpenWeatherClient::with_http_client(http.clone(), &config.openweather);
        let deriver = AdvisoryDeriver::new(config.advisory.on_no_match);

        let mut resolver = LocationResolver::new(Arc::new(client.clone()), &config.geocoding);
        if config.cache.enabled {
            match PersistentCache::open(&config.cache.location) {
                Ok(cache) => resolver = resolver.with_cache(cache, config.cache.ttl()),
                Err(e) => tracing::warn!(
                    "Geocode cache at {} unavailable, continuing without it: {}",
                    config.cache.location,
                    e
                ),
            }
        }

        let route = RouteWeatherService::new(
            Arc::new(resolver),
            Arc::new(WeatherFetcher::new(client, deriver)),
            deriver,
            config.server.lookup_timeout(),
        );

        Ok(Self {
            route: Arc::new(route),
            official: Arc::new(OfficialAdvisories::new(http, &config.official.advisory_url)),
        })
    }
}

/// Handler error rendered as `{"error": ...}`; the body only ever carries the
/// user-facing message
pub struct ApiError(WeatherPhError);

impl From<WeatherPhError> for ApiError {
    fn from(err: WeatherPhError) -> Self {
        Self(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        Self(WeatherPhError::validation(
            "query parameters are missing or malformed",
        ))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self(WeatherPhError::validation(
            "request body must be a JSON object with the expected fields",
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WeatherPhError::Validation { .. } => StatusCode::BAD_REQUEST,
            WeatherPhError::NotFound { .. } => StatusCode::NOT_FOUND,
            WeatherPhError::Api { .. } => StatusCode::BAD_GATEWAY,
            WeatherPhError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub origin_lat: Option<f64>,
    pub origin_lon: Option<f64>,
    pub destination_lat: Option<f64>,
    pub destination_lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AdvisoryQuery {
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocalWeatherResponse {
    pub weather: WeatherObservation,
    pub advisory: AdvisoryPair,
}

#[derive(Debug, Serialize)]
pub struct OfficialAdvisoryResponse {
    pub location: Option<String>,
    pub advisories: Vec<String>,
}

fn pair(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinate> {
    Some(Coordinate::new(latitude?, longitude?))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/route", get(get_route).post(post_route))
        .route("/localweather", get(get_local_weather))
        .route("/forecast", get(get_forecast))
        .route("/advisories", get(get_advisories))
        .route("/health", get(health))
        .with_state(state)
}

async fn get_route(
    State(state): State<AppState>,
    query: Result<Query<RouteRequest>, QueryRejection>,
) -> Result<Json<RouteWeatherResult>, ApiError> {
    let Query(request) = query?;
    route(state, request).await
}

async fn post_route(
    State(state): State<AppState>,
    body: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<RouteWeatherResult>, ApiError> {
    let Json(request) = body?;
    route(state, request).await
}

async fn route(state: AppState, request: RouteRequest) -> Result<Json<RouteWeatherResult>, ApiError> {
    let origin = request.origin.trim();
    let destination = request.destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(WeatherPhError::validation("origin and destination are both required").into());
    }

    let result = state
        .route
        .build_route_weather_result(
            origin,
            destination,
            pair(request.origin_lat, request.origin_lon),
            pair(request.destination_lat, request.destination_lon),
        )
        .await;
    Ok(Json(result))
}

async fn get_local_weather(
    State(state): State<AppState>,
    query: Result<Query<PointQuery>, QueryRejection>,
) -> Result<Json<LocalWeatherResponse>, ApiError> {
    let Query(query) = query?;
    let coordinate = Coordinate::new(query.lat, query.lon);
    if !coordinate.is_valid() {
        return Err(WeatherPhError::validation("lat/lon out of range").into());
    }

    let (weather, advisory) = state.route.local_weather(coordinate).await;
    Ok(Json(LocalWeatherResponse { weather, advisory }))
}

async fn get_forecast(
    State(state): State<AppState>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<ForecastObservation>, ApiError> {
    let Query(query) = query?;
    let place = query.location.as_deref().map(str::trim).unwrap_or_default();
    let coordinate = pair(query.lat, query.lon);

    match coordinate {
        Some(c) if c.is_valid() => {}
        _ if !place.is_empty() => {}
        _ => {
            return Err(
                WeatherPhError::validation("either location or valid lat/lon is required").into(),
            );
        }
    }

    Ok(Json(state.route.forecast(place, coordinate).await))
}

async fn get_advisories(
    State(state): State<AppState>,
    query: Result<Query<AdvisoryQuery>, QueryRejection>,
) -> Result<Json<OfficialAdvisoryResponse>, ApiError> {
    let Query(query) = query?;
    let location = query
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    let advisories = state.official.advisories_for(location.as_deref()).await;

    Ok(Json(OfficialAdvisoryResponse {
        location,
        advisories,
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}
