//! Configuration for forecast providers.

use serde::{Deserialize, Serialize};

/// Weather provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast API base URL
    pub base_url: String,
    /// IP geolocation endpoint
    pub geolocation_url: String,
    /// Days of forecast to request
    pub forecast_days: u8,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            geolocation_url: "https://ipapi.co/json/".to_string(),
            forecast_days: 10,
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WeatherConfig::default();
        assert_eq!(config.forecast_days, 10);
        assert!(config.base_url.starts_with("https://"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = WeatherConfig::default();
        config.forecast_days = 7;
        let yaml = config.to_yaml().unwrap();
        let parsed = WeatherConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.forecast_days, 7);
    }
}
