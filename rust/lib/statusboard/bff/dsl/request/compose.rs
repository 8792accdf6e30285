//! Compose form requests.

use flux_derive::request;

/// Replace the status input text.
#[request("compose/update")]
pub struct ComposeUpdateReq {
    pub content: String,
}

#[request("compose/toggle-location")]
pub struct ToggleLocationReq {}

#[request("compose/toggle-weather")]
pub struct ToggleWeatherReq {}
