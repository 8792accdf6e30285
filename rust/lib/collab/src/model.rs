//! Status post and enrichment data, as stored in the feed collection.
//!
//! Field names are camelCase on the wire and optional enrichment is
//! skipped when absent, so a plain post carries exactly
//! `{content, authorId, authorEmail, createdAt}`. An enriched post stores
//! the address string under `location` with `coordinates` beside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed-in account as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A resolved device location: the lookup result, not the stored shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLocation {
    pub address: String,
    pub coordinates: Coordinates,
}

/// Current conditions, pre-formatted for display (`"22°C"`, `"65%"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature: String,
    pub description: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<String>,
}

/// A post as read back from the feed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPost {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    /// `None` while the server timestamp is still pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Human-readable address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReading>,
}

/// A post about to be appended. The store assigns `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Client-chosen document id; a retry with the same id never duplicates.
    #[serde(skip)]
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReading>,
}

impl NewPost {
    /// Attach a resolved location: the address goes under `location`,
    /// the coordinates beside it.
    pub fn located_at(mut self, location: Option<PostLocation>) -> Self {
        match location {
            Some(PostLocation { address, coordinates }) => {
                self.location = Some(address);
                self.coordinates = Some(coordinates);
            }
            None => {
                self.location = None;
                self.coordinates = None;
            }
        }
        self
    }

    /// The stored form once the server has stamped it.
    pub fn into_post(self, created_at: Option<DateTime<Utc>>) -> StatusPost {
        StatusPost {
            id: self.id,
            content: self.content,
            author_id: self.author_id,
            author_email: self.author_email,
            created_at,
            location: self.location,
            coordinates: self.coordinates,
            weather: self.weather,
        }
    }
}

/// The ordered query the feed screen subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub collection: String,
    /// Upper bound on returned posts; `None` returns everything.
    pub limit: Option<usize>,
}

impl FeedQuery {
    /// Newest-first query over a collection.
    pub fn newest_first(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Sort newest first. Posts with a pending timestamp lead, since they
/// were written after everything the server has already stamped.
pub fn sort_newest_first(posts: &mut [StatusPost]) {
    posts.sort_by(|a, b| match (a.created_at, b.created_at) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    });
}
