use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// External configuration, read once at startup. See `piink.example.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Location for the weather forecast.
    pub latitude: f64,
    pub longitude: f64,
    /// Minutes between weather fetches.
    pub weather_refresh_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: 52.52,
            longitude: 13.405,
            weather_refresh_minutes: 10,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "No configuration found at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_config() {
        let config: Config = serde_json::from_str(
            r#"{"latitude": 48.2, "longitude": 16.37, "weather_refresh_minutes": 5}"#,
        )
        .unwrap();

        assert_eq!(config.latitude, 48.2);
        assert_eq!(config.longitude, 16.37);
        assert_eq!(config.weather_refresh_minutes, 5);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"latitude": 1.0}"#).unwrap();

        assert_eq!(config.latitude, 1.0);
        assert_eq!(config.longitude, Config::default().longitude);
        assert_eq!(
            config.weather_refresh_minutes,
            Config::default().weather_refresh_minutes
        );
    }
}
