//! Forecast providers for the sustainability scorer
//!
//! The scorer needs a short daily forecast to judge watering and harvest
//! timing. This crate supplies it:
//!
//! - [`WeatherProvider`]: trait over forecast sources
//! - [`OpenMeteoProvider`]: Open-Meteo daily forecast over HTTP
//! - [`StaticProvider`]: fixed forecast for offline use and tests
//! - [`IpLocator`]: approximate location from the caller's IP
//!
//! # Example
//!
//! ```ignore
//! use farm_weather::{local_forecast, IpLocator, OpenMeteoProvider, WeatherConfig};
//!
//! let config = WeatherConfig::default();
//! let locator = IpLocator::new(&config)?;
//! let provider = OpenMeteoProvider::new(&config)?;
//! let weather = local_forecast(&locator, &provider).await;
//! ```

pub mod codes;
pub mod config;
pub mod locate;
pub mod provider;

pub use codes::{describe_weather_code, WeatherInfo};
pub use config::WeatherConfig;
pub use locate::{local_forecast, IpLocator};
pub use provider::{Location, OpenMeteoProvider, StaticProvider, WeatherError, WeatherProvider};
