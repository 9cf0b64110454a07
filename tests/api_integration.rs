//! Router-level tests for the JSON API with scripted geocoding and weather.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use weatherph::api::AppState;
use weatherph::api_client::build_http_client;
use weatherph::config::{GeocodingConfig, OpenWeatherConfig, ServerConfig};
use weatherph::models::{Conditions, ForecastObservation};
use weatherph::official::OfficialAdvisories;
use weatherph::{
    AdvisoryDeriver, Coordinate, GeocodingProvider, GeocodingResult, LocationResolver,
    RouteWeatherService, WeatherObservation, WeatherSource, web,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Gazetteer;

#[async_trait]
impl GeocodingProvider for Gazetteer {
    async fn search(&self, query: &str, _limit: u8) -> weatherph::Result<Vec<GeocodingResult>> {
        let hit = |name: &str, lat: f64, lon: f64| GeocodingResult {
            name: name.to_string(),
            lat,
            lon,
            country: "PH".to_string(),
            state: None,
        };
        Ok(match query {
            "manila,PH" => vec![hit("Manila", 14.5995, 120.9842)],
            "tagaytay,PH" => vec![hit("Tagaytay", 14.1153, 120.9621)],
            _ => Vec::new(),
        })
    }
}

/// Clear and hot north of the equator, unavailable south of it
struct StubWeather;

#[async_trait]
impl WeatherSource for StubWeather {
    async fn current_weather(&self, coordinate: Coordinate) -> WeatherObservation {
        if coordinate.latitude < 0.0 {
            return WeatherObservation::unavailable("Weather unavailable for this location.");
        }
        WeatherObservation::Available(Conditions {
            condition_main: "Clear".to_string(),
            condition_description: "clear sky".to_string(),
            temperature_celsius: Some(35.0),
            humidity_percent: Some(60),
            wind_speed_ms: Some(2.0),
            sunrise: Some(1_717_190_904),
            sunset: Some(1_717_237_611),
            utc_offset_seconds: Some(28_800),
            resolved_location_name: None,
            coordinate,
        })
    }

    async fn forecast(&self, coordinate: Coordinate) -> ForecastObservation {
        ForecastObservation::Available {
            city_name: Some("Stub City".to_string()),
            utc_offset_seconds: Some(28_800),
            coordinate,
            slots: Vec::new(),
        }
    }
}

fn app(advisory_url: &str) -> axum::Router {
    let resolver = LocationResolver::new(Arc::new(Gazetteer), &GeocodingConfig::default());
    let route = RouteWeatherService::new(
        Arc::new(resolver),
        Arc::new(StubWeather),
        AdvisoryDeriver::default(),
        Duration::from_secs(5),
    );
    let http = build_http_client(&OpenWeatherConfig {
        max_retries: 0,
        ..OpenWeatherConfig::default()
    })
    .unwrap();

    let state = AppState {
        route: Arc::new(route),
        official: Arc::new(OfficialAdvisories::new(http, advisory_url)),
    };
    web::build_router(state, &ServerConfig::default())
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app("http://127.0.0.1:9"), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_route_by_name() {
    let (status, body) = send(
        app("http://127.0.0.1:9"),
        get("/api/route?origin=Manila&destination=Tagaytay"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin"], "Manila");
    assert_eq!(body["origin_weather"]["condition_description"], "clear sky");
    assert_eq!(body["origin_weather"]["resolved_location_name"], "Manila");
    assert_eq!(
        body["origin_weather"]["local_sunrise"],
        "2024-06-01T05:28:24+08:00"
    );
    assert!(
        body["destination_advisory"]["weather_advisory"]
            .as_str()
            .unwrap()
            .contains("Clear Skies")
    );
    assert!(
        body["destination_advisory"]["temperature_advisory"]
            .as_str()
            .unwrap()
            .contains("Heat Caution")
    );
    assert!(body["distance_km"].as_f64().unwrap() > 40.0);
}

#[tokio::test]
async fn test_route_post_with_partial_failure() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/route")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "origin": "Manila",
                "destination": "Narnia",
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(app("http://127.0.0.1:9"), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["origin_weather"]["condition_main"].is_string());
    assert_eq!(
        body["destination_weather"]["error"],
        "Location not found in the Philippines: Narnia"
    );
    assert!(body["destination_coordinate"].is_null());
    assert!(body["destination_advisory"]["temperature_advisory"].is_null());
}

#[tokio::test]
async fn test_route_with_supplied_coordinates() {
    let (status, body) = send(
        app("http://127.0.0.1:9"),
        get("/api/route?origin=Home&destination=Office&origin_lat=14.6&origin_lon=121.0&destination_lat=14.55&destination_lon=121.05"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origin_coordinate"]["latitude"], 14.6);
    assert_eq!(body["destination_coordinate"]["longitude"], 121.05);
}

#[tokio::test]
async fn test_route_requires_both_places() {
    let (status, body) = send(
        app("http://127.0.0.1:9"),
        get("/api/route?origin=%20&destination=Tagaytay"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
}

#[tokio::test]
async fn test_local_weather() {
    let (status, body) = send(
        app("http://127.0.0.1:9"),
        get("/api/localweather?lat=14.5995&lon=120.9842"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["weather"]["temperature_celsius"], 35.0);
    assert!(body["advisory"]["weather_advisory"].is_string());
}

#[tokio::test]
async fn test_local_weather_rejects_out_of_range() {
    let (status, _) = send(
        app("http://127.0.0.1:9"),
        get("/api/localweather?lat=95&lon=120"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forecast_by_location() {
    let (status, body) = send(
        app("http://127.0.0.1:9"),
        get("/api/forecast?location=Tagaytay"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city_name"], "Stub City");
    assert_eq!(body["coordinate"]["latitude"], 14.1153);
}

#[tokio::test]
async fn test_forecast_needs_a_place() {
    let (status, _) = send(app("http://127.0.0.1:9"), get("/api/forecast")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_official_advisories_filtered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather/weather-advisory"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="advisory-title">Rainfall Advisory</div>
                <div class="advisory-content">Light to moderate rains over Cavite and Batangas.</div>
                <div class="advisory-content">Thunderstorms over Eastern Visayas.</div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/weather/weather-advisory", server.uri());
    let (status, body) = send(app(&url), get("/api/advisories?location=Cavite")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Cavite");
    assert_eq!(
        body["advisories"],
        json!(["Light to moderate rains over Cavite and Batangas."])
    );
}

#[tokio::test]
async fn test_official_advisories_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server.uri()), get("/api/advisories")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["advisories"],
        json!(["Unable to load official advisories."])
    );
}

#[tokio::test]
async fn test_official_advisories_unreachable_for_place() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = send(
        app(&server.uri()),
        get("/api/advisories?location=Cavite"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location"], "Cavite");
    assert_eq!(
        body["advisories"],
        json!(["Unable to load official advisories."])
    );
}

#[tokio::test]
async fn test_route_missing_destination_is_json_error() {
    let (status, body) = send(app("http://127.0.0.1:9"), get("/api/route?origin=Manila")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid input"));
    assert!(!message.contains("deserialize"));
}

#[tokio::test]
async fn test_local_weather_bad_number_is_json_error() {
    let (status, body) = send(
        app("http://127.0.0.1:9"),
        get("/api/localweather?lat=abc&lon=1"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().contains("float"));
}

#[tokio::test]
async fn test_route_post_malformed_body_is_json_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/route")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"origin\": "))
        .unwrap();

    let (status, body) = send(app("http://127.0.0.1:9"), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
}
