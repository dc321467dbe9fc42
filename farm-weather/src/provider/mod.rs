//! Forecast provider abstraction.
//!
//! - Open-Meteo over HTTP
//! - Static forecast for offline use and tests

pub mod fixed;
pub mod open_meteo;
pub mod traits;

pub use fixed::StaticProvider;
pub use open_meteo::OpenMeteoProvider;
pub use traits::{Location, WeatherError, WeatherProvider};
