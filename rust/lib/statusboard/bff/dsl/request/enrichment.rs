use flux_derive::request;

/// Look up location then weather for the preview panel.
#[request("enrichment/refresh")]
pub struct RefreshEnrichmentReq {}
