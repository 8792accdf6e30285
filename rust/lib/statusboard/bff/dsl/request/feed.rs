//! Feed screen lifecycle.

use flux_derive::request;

/// Feed screen mounted: open the live subscription.
#[request("feed/open")]
pub struct OpenFeedReq {}

/// Feed screen unmounted: release it.
#[request("feed/close")]
pub struct CloseFeedReq {}
