//! Feed state: stored at `feed/state`.

use chrono::{DateTime, Utc};
use flux_derive::state;
use serde::{Deserialize, Serialize};
use statusboard_collab::{Coordinates, WeatherReading};

/// Mirror of the latest feed snapshot, newest first.
#[state("feed/state")]
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedState {
    pub items: Vec<FeedItem>,
    /// A feed subscription is open.
    pub subscribed: bool,
    /// Subscribed but no snapshot has arrived yet.
    pub loading: bool,
    /// Last subscription error; cleared by the next snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single post rendered in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// "Just now", "5 minutes ago", ...
    pub time_label: String,
    /// Address the post was made from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReading>,
}
