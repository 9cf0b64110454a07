//! Data models for the WeatherPH service
//!
//! All values here are request-scoped and never persisted:
//! - Location: coordinates and geocoded places
//! - Weather: current and forecast observations
//! - Route: the aggregate handed to the presentation layer

pub mod location;
pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, Location};
pub use route::RouteWeatherResult;
pub use weather::{Conditions, ForecastObservation, ForecastSlot, WeatherObservation};
