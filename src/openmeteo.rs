use std::time::Duration;

use anyhow::anyhow;
use serde::Deserialize;

use crate::retry::retry;

const RETRIES: usize = 2;
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Blocking client for the Open-Meteo forecast API. Cheap to clone into a
/// scheduled task; each call builds its own request.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    latitude: f64,
    longitude: f64,
}

impl OpenMeteoClient {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Fetch the current conditions. Blocks; only ever called from inside a
    /// scheduled background task.
    pub fn current(&self) -> anyhow::Result<WeatherReading> {
        log::info!("Making GET request to Open-Meteo API (/v1/forecast)");

        let url = format!(
            "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}&current_weather=true",
            self.latitude, self.longitude
        );

        let response = retry(|| ureq::get(&url).call(), RETRIES, RETRY_BACKOFF)?;
        match response.status() {
            200 => {
                log::info!("Got HTTP {} from Open-Meteo API", response.status());
                let forecast: Forecast = serde_json::from_reader(response.into_reader())?;
                Ok(forecast.current_weather)
            }
            status => {
                log::error!("Unexpected status code from Open-Meteo API: HTTP {status}");
                Err(anyhow!("HTTP {status}"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Forecast {
    current_weather: WeatherReading,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
}

impl WeatherReading {
    /// Short human-readable label for the WMO weather code.
    pub fn describe(&self) -> &'static str {
        match self.weathercode {
            0 => "klar",
            1..=3 => "bewölkt",
            45 | 48 => "Nebel",
            51..=57 => "Niesel",
            61..=67 | 80..=82 => "Regen",
            71..=77 | 85 | 86 => "Schnee",
            95..=99 => "Gewitter",
            _ => "",
        }
    }
}
