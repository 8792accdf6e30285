//! Enrichment preview: stored at `enrichment/state`.

use flux_derive::state;
use serde::{Deserialize, Serialize};
use statusboard_collab::{PostLocation, WeatherReading};

/// Result of the "Get Location & Weather" button.
#[state("enrichment/state")]
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentState {
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<PostLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReading>,
    /// False when `weather` is a fallback reading.
    pub weather_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
