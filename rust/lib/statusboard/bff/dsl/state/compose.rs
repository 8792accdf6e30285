//! Compose state: stored at `compose/state`.

use flux_derive::state;
use serde::{Deserialize, Serialize};

/// The status input and its enrichment opt-ins.
#[state("compose/state")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeState {
    pub content: String,
    pub include_location: bool,
    pub include_weather: bool,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Document id of the submission in flight, reused when the same
    /// text is retried after a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_id: Option<String>,
}

impl ComposeState {
    pub fn empty() -> Self {
        Self {
            content: String::new(),
            include_location: false,
            include_weather: false,
            busy: false,
            error: None,
            notice: None,
            pending_id: None,
        }
    }
}
