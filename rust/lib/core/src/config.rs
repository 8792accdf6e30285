//! Application configuration.
//!
//! Reads/writes `~/.statusboard/config.toml`. The `setup` command fills
//! it interactively; every section has working defaults so a missing
//! file means "local demo mode" (in-memory backend, mock location,
//! unconfigured weather).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StatusError;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "STATUSBOARD_CONFIG";

/// Default OpenWeatherMap current-conditions endpoint.
pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Default OpenWeatherMap reverse-geocoding endpoint.
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://api.openweathermap.org/geo/1.0/reverse";

/// Default Expo push relay.
pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Whole-application configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub firebase: FirebaseConfig,
    pub weather: WeatherConfig,
    pub location: LocationConfig,
    pub notifications: NotificationConfig,
    pub feed: FeedConfig,
    pub session: SessionConfig,
}

/// Backend-as-a-service project credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
}

impl FirebaseConfig {
    /// Both the API key and the project id are needed to reach the
    /// identity and document services.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.project_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: String,
    pub endpoint: String,
    pub geocode_endpoint: String,
    pub units: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_WEATHER_ENDPOINT.to_string(),
            geocode_endpoint: DEFAULT_GEOCODE_ENDPOINT.to_string(),
            units: "metric".to_string(),
        }
    }
}

impl WeatherConfig {
    /// Placeholder keys left by older setup templates count as missing.
    pub fn is_configured(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty()
            && key != "YOUR_OPENWEATHERMAP_API_KEY"
            && key != "your-openweathermap-api-key-here"
    }
}

/// Device location stand-in. Terminals and simulators have no GPS, so
/// the coordinates come from here and only the address is looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub reverse_geocode: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: 33.749,
            longitude: -84.388,
            address: "Atlanta, GA, USA (Mock Location)".to_string(),
            reverse_geocode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub expo_project_id: String,
    pub push_endpoint: String,
    /// Device push token registered by the mobile shell. Empty until a
    /// device has registered.
    pub device_token: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            expo_project_id: String::new(),
            push_endpoint: DEFAULT_PUSH_ENDPOINT.to_string(),
            device_token: String::new(),
        }
    }
}

impl NotificationConfig {
    pub fn is_configured(&self) -> bool {
        let id = self.expo_project_id.trim();
        !id.is_empty() && id != "your-expo-project-id"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Document collection holding status posts.
    pub collection: String,
    /// Character budget for a post; 0 disables the check.
    pub max_content_chars: usize,
    /// How often the REST feed store re-runs the ordered query.
    pub poll_interval_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            collection: "statuses".to_string(),
            max_content_chars: 280,
            poll_interval_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the identity collaborator caches its refresh token.
    /// Empty means `~/.statusboard/session.json`.
    pub cache_path: String,
}

impl SessionConfig {
    pub fn resolve_cache_path(&self) -> PathBuf {
        if self.cache_path.trim().is_empty() {
            config_dir().join("session.json")
        } else {
            PathBuf::from(&self.cache_path)
        }
    }
}

impl AppConfig {
    /// Default config file path: `$STATUSBOARD_CONFIG` or
    /// `~/.statusboard/config.toml`.
    pub fn default_path() -> PathBuf {
        match std::env::var(CONFIG_ENV) {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => config_dir().join("config.toml"),
        }
    }

    /// Load config from disk, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, StatusError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| StatusError::Internal(format!("read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, StatusError> {
        toml::from_str(content).map_err(|e| StatusError::Decode(format!("config: {}", e)))
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> Result<(), StatusError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StatusError::Internal(format!("create {}: {}", parent.display(), e)))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| StatusError::Internal(format!("encode config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| StatusError::Internal(format!("write {}: {}", path.display(), e)))?;
        Ok(())
    }
}

/// Return the Status Board config directory (`~/.statusboard`).
pub fn config_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".statusboard")
}
