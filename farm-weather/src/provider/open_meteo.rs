//! Open-Meteo forecast provider.
//!
//! Requests the daily maximum temperature (Fahrenheit) and WMO weather code
//! and maps each day to a [`WeatherDay`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use sustainability::WeatherDay;
use tracing::debug;

use super::traits::*;
use crate::codes::describe_weather_code;
use crate::config::WeatherConfig;

/// Open-Meteo backed provider.
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    forecast_days: u8,
}

impl OpenMeteoProvider {
    /// Create a provider from configuration.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            forecast_days: config.forecast_days,
        })
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }
}

/// Open-Meteo forecast response.
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyResponse,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    weathercode: Vec<Option<i32>>,
}

impl DailyResponse {
    fn into_days(self) -> Result<Vec<WeatherDay>, WeatherError> {
        if self.time.len() != self.temperature_2m_max.len()
            || self.time.len() != self.weathercode.len()
        {
            return Err(WeatherError::InvalidResponse(format!(
                "daily arrays differ in length: {} days, {} temperatures, {} codes",
                self.time.len(),
                self.temperature_2m_max.len(),
                self.weathercode.len()
            )));
        }

        let mut days = Vec::with_capacity(self.time.len());
        for ((raw_date, temp), code) in self
            .time
            .iter()
            .zip(self.temperature_2m_max)
            .zip(self.weathercode)
        {
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
                WeatherError::InvalidResponse(format!("bad date {raw_date}: {e}"))
            })?;
            let Some(temp) = temp else {
                debug!(%date, "Skipping day without temperature");
                continue;
            };
            // Missing codes fall through to "Unknown".
            let info = describe_weather_code(code.unwrap_or(i32::MAX));

            days.push(WeatherDay {
                date,
                temp,
                weather: info.description.to_string(),
                icon: info.icon.to_string(),
                precipitation: None,
            });
        }
        Ok(days)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> &str {
        "open-meteo"
    }

    async fn forecast(&self, location: Location) -> Result<Vec<WeatherDay>, WeatherError> {
        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("daily", "temperature_2m_max,weathercode".to_string()),
                ("temperature_unit", "fahrenheit".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", self.forecast_days.to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::InvalidResponse(e.to_string()))?;

        let days = forecast.daily.into_days()?;
        debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            days = days.len(),
            "Fetched forecast"
        );
        Ok(days)
    }
}
