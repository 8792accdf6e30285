//! Weather collaborator over the OpenWeatherMap current-conditions API.
//!
//! Never fails: an unconfigured key or any failed call yields a fixed
//! fallback reading tagged with the reason.

use async_trait::async_trait;
use serde::Deserialize;
use statusboard_core::config::WeatherConfig;
use statusboard_core::StatusError;

use crate::enriched::Enriched;
use crate::http;
use crate::model::{Coordinates, WeatherReading};

#[async_trait]
pub trait WeatherProvider: Send + Sync + 'static {
    async fn current_conditions(&self, coordinates: Coordinates) -> Enriched<WeatherReading>;
}

/// Reading used when no API key is configured.
pub fn unconfigured_reading() -> WeatherReading {
    WeatherReading {
        temperature: "N/A".into(),
        description: "Weather API not configured".into(),
        icon: "❓".into(),
        humidity: None,
        wind_speed: None,
    }
}

/// Reading used when the provider call fails.
pub fn fallback_reading() -> WeatherReading {
    WeatherReading {
        temperature: "22°C".into(),
        description: "Partly cloudy (Mock Data)".into(),
        icon: "⛅".into(),
        humidity: Some("65%".into()),
        wind_speed: Some("3.2 m/s".into()),
    }
}

/// Emoji for an OpenWeatherMap icon code.
pub fn icon_for(code: &str) -> &'static str {
    match code {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" | "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" | "10n" => "🌧️",
        "10d" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => "❓",
    }
}

/// Whole-degree label. Halves round up, so -2.5 reads as -2°C.
pub fn celsius_label(temp: f64) -> String {
    format!("{}°C", (temp + 0.5).floor() as i64)
}

#[derive(Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Deserialize)]
struct OwmWind {
    speed: f64,
}

impl OwmResponse {
    fn into_reading(self) -> Result<WeatherReading, StatusError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| StatusError::Decode("weather list is empty".into()))?;
        Ok(WeatherReading {
            temperature: celsius_label(self.main.temp),
            description: condition.description,
            icon: icon_for(&condition.icon).to_string(),
            humidity: Some(format!("{}%", self.main.humidity)),
            wind_speed: Some(format!("{} m/s", self.wind.speed)),
        })
    }
}

pub struct OpenWeatherClient {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    async fn fetch(&self, coordinates: Coordinates) -> Result<WeatherReading, StatusError> {
        let resp = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("appid", self.config.api_key.clone()),
                ("units", self.config.units.clone()),
            ])
            .send()
            .await?;
        tracing::debug!(status = resp.status().as_u16(), "weather call");
        let body: OwmResponse = http::parse(resp).await?;
        body.into_reading()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_conditions(&self, coordinates: Coordinates) -> Enriched<WeatherReading> {
        if !self.config.is_configured() {
            return Enriched::fallback(unconfigured_reading(), "weather API key not configured");
        }
        match self.fetch(coordinates).await {
            Ok(reading) => Enriched::Live(reading),
            Err(e) => {
                tracing::warn!(error = %e, "weather lookup failed, using fallback");
                Enriched::fallback(fallback_reading(), e.to_string())
            }
        }
    }
}
