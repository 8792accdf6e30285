use flux_derive::request;

/// Submit the compose input as a new status.
#[request("status/post")]
pub struct PostStatusReq {}
