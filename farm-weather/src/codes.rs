//! WMO weather-code mapping.

/// Short description and icon for a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherInfo {
    pub description: &'static str,
    pub icon: &'static str,
}

/// Collapse a WMO weather code into the coarse categories the scorer reads.
///
/// Codes up to 3 are clear, up to 48 cloudy or foggy, up to 67 drizzle or
/// rain, up to 77 snow; everything above is reported as unknown.
pub fn describe_weather_code(code: i32) -> WeatherInfo {
    match code {
        i32::MIN..=3 => WeatherInfo {
            description: "Clear",
            icon: "☀️",
        },
        4..=48 => WeatherInfo {
            description: "Cloudy",
            icon: "☁️",
        },
        49..=67 => WeatherInfo {
            description: "Rain",
            icon: "🌧️",
        },
        68..=77 => WeatherInfo {
            description: "Snow",
            icon: "❄️",
        },
        _ => WeatherInfo {
            description: "Unknown",
            icon: "❓",
        },
    }
}
