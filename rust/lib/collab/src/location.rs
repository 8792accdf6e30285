//! Location collaborator: permission, coordinates, reverse geocoding.

use async_trait::async_trait;
use serde::Deserialize;
use statusboard_core::config::{LocationConfig, WeatherConfig};
use statusboard_core::StatusError;

use crate::enriched::{LocationFailure, LocationLookup};
use crate::http;
use crate::model::{Coordinates, PostLocation};

#[async_trait]
pub trait LocationProvider: Send + Sync + 'static {
    async fn request_permission(&self) -> bool;

    async fn current_coordinates(&self) -> Result<Coordinates, StatusError>;

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, StatusError>;
}

/// Permission → coordinates → address. Each step short-circuits; nothing
/// is retried.
pub async fn locate(provider: &dyn LocationProvider) -> LocationLookup {
    if !provider.request_permission().await {
        return LocationLookup::failed(LocationFailure::PermissionDenied, "permission not granted");
    }
    let coordinates = match provider.current_coordinates().await {
        Ok(c) => c,
        Err(e) => return LocationLookup::failed(LocationFailure::CoordinatesUnavailable, e.to_string()),
    };
    match provider.reverse_geocode(coordinates).await {
        Ok(address) => LocationLookup::Found(PostLocation { address, coordinates }),
        Err(e) => {
            tracing::debug!(error = %e, "reverse geocode failed");
            LocationLookup::failed(LocationFailure::GeocodeFailed, e.to_string())
        }
    }
}

/// A device stand-in with fixed coordinates and address.
///
/// Terminals and simulators have no GPS; this is the demo location.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coordinates: Option<Coordinates>,
    address: String,
    granted: bool,
}

impl FixedLocation {
    pub fn new(coordinates: Coordinates, address: impl Into<String>) -> Self {
        Self {
            coordinates: Some(coordinates),
            address: address.into(),
            granted: true,
        }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(
            Coordinates::new(config.latitude, config.longitude),
            config.address.clone(),
        )
    }

    /// A device where the user declined the permission prompt.
    pub fn denied() -> Self {
        Self {
            coordinates: None,
            address: String::new(),
            granted: false,
        }
    }

    /// Permission granted but no fix available.
    pub fn no_fix() -> Self {
        Self {
            coordinates: None,
            address: String::new(),
            granted: true,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> bool {
        self.granted
    }

    async fn current_coordinates(&self) -> Result<Coordinates, StatusError> {
        self.coordinates
            .ok_or_else(|| StatusError::Unavailable("no location fix".into()))
    }

    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<String, StatusError> {
        Ok(self.address.clone())
    }
}

/// Fixed coordinates with the address resolved through the
/// OpenWeatherMap reverse-geocoding endpoint.
pub struct GeocodedLocation {
    http: reqwest::Client,
    coordinates: Coordinates,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GeocodeHit {
    name: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl GeocodedLocation {
    pub fn new(location: &LocationConfig, weather: &WeatherConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            coordinates: Coordinates::new(location.latitude, location.longitude),
            endpoint: weather.geocode_endpoint.clone(),
            api_key: weather.api_key.clone(),
        }
    }
}

#[async_trait]
impl LocationProvider for GeocodedLocation {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn current_coordinates(&self) -> Result<Coordinates, StatusError> {
        Ok(self.coordinates)
    }

    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, StatusError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("limit", "1".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;
        let hits: Vec<GeocodeHit> = http::parse(resp).await?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| StatusError::NotFound("no address for these coordinates".into()))?;
        let parts: Vec<String> = std::iter::once(hit.name)
            .chain(hit.state)
            .chain(hit.country)
            .filter(|p| !p.is_empty())
            .collect();
        Ok(parts.join(", "))
    }
}
