//! Provider serving a fixed forecast.
//!
//! Useful offline and in tests; optionally fails every call.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use sustainability::WeatherDay;

use super::traits::*;

/// Provider returning the same forecast for every location.
pub struct StaticProvider {
    days: Vec<WeatherDay>,
    available: AtomicBool,
    call_count: AtomicU32,
}

impl StaticProvider {
    pub fn new(days: Vec<WeatherDay>) -> Self {
        Self {
            days,
            available: AtomicBool::new(true),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set availability. An unavailable provider errors on every call.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Number of forecast calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for StaticProvider {
    fn id(&self) -> &str {
        "static"
    }

    async fn forecast(&self, _location: Location) -> Result<Vec<WeatherDay>, WeatherError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(WeatherError::NetworkError(
                "Static provider disabled".to_string(),
            ));
        }
        Ok(self.days.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_static_provider() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let provider = StaticProvider::new(vec![WeatherDay::new(day, 70.0, "Clear")]);

        let days = provider.forecast(Location::new(1.0, 2.0)).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_static_unavailable() {
        let provider = StaticProvider::new(vec![]).with_available(false);
        assert!(provider.forecast(Location::new(1.0, 2.0)).await.is_err());
    }
}
