//! Location lookup and the "forecast for wherever we are" flow.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use sustainability::WeatherDay;
use tracing::{info, warn};

use crate::config::WeatherConfig;
use crate::provider::{Location, WeatherError, WeatherProvider};

/// Resolves the caller's approximate location from an IP geolocation service.
pub struct IpLocator {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct GeolocationResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl IpLocator {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            url: config.geolocation_url.clone(),
        })
    }

    /// Look up the current location.
    pub async fn locate(&self) -> Result<Location, WeatherError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: GeolocationResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::InvalidResponse(e.to_string()))?;

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Location::new(latitude, longitude)),
            _ => Err(WeatherError::InvalidResponse(
                "geolocation response missing coordinates".to_string(),
            )),
        }
    }
}

/// Fetch the forecast for the caller's location.
///
/// Any failure is logged and yields an empty forecast, which the scorer
/// reports as "score unavailable".
pub async fn local_forecast(locator: &IpLocator, provider: &dyn WeatherProvider) -> Vec<WeatherDay> {
    let location = match locator.locate().await {
        Ok(location) => location,
        Err(e) => {
            warn!(error = %e, "Location lookup failed");
            return Vec::new();
        }
    };

    match provider.forecast(location).await {
        Ok(days) => {
            info!(provider = provider.id(), days = days.len(), "Forecast loaded");
            days
        }
        Err(e) => {
            warn!(provider = provider.id(), error = %e, "Forecast fetch failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn locator_with(body: serde_json::Value) -> (MockServer, IpLocator) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let config = WeatherConfig {
            geolocation_url: format!("{}/json/", server.uri()),
            ..WeatherConfig::default()
        };
        let locator = IpLocator::new(&config).unwrap();
        (server, locator)
    }

    #[tokio::test]
    async fn test_locate() {
        let (_server, locator) =
            locator_with(serde_json::json!({"latitude": 41.9, "longitude": -87.6, "city": "Chicago"}))
                .await;
        let location = locator.locate().await.unwrap();
        assert_eq!(location, Location::new(41.9, -87.6));
    }

    #[tokio::test]
    async fn test_local_forecast_uses_provider() {
        let (_server, locator) =
            locator_with(serde_json::json!({"latitude": 41.9, "longitude": -87.6})).await;
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let provider = StaticProvider::new(vec![WeatherDay::new(day, 70.0, "Clear")]);

        let days = local_forecast(&locator, &provider).await;
        assert_eq!(days.len(), 1);
    }

    #[tokio::test]
    async fn test_local_forecast_empty_on_failure() {
        let (_server, locator) = locator_with(serde_json::json!({"error": true})).await;
        let provider = StaticProvider::new(vec![]);

        let days = local_forecast(&locator, &provider).await;
        assert!(days.is_empty());
        // Location failed, so the provider was never asked.
        assert_eq!(provider.call_count(), 0);
    }
}
