//! Core traits for forecast providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sustainability::WeatherDay;

/// Error types for weather operations.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// HTTP client could not be built
    #[error("Client setup failed: {0}")]
    ClientSetup(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Source of daily forecasts.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Provider identifier.
    fn id(&self) -> &str;

    /// Daily forecast for a location, oldest day first.
    async fn forecast(&self, location: Location) -> Result<Vec<WeatherDay>, WeatherError>;
}
