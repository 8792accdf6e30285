//! App lifecycle requests.

use flux_derive::request;

/// Launch: enter `Loading` and start listening for the session.
#[request("app/initialize")]
pub struct InitializeReq {}

/// Release every live subscription and clear the session.
#[request("app/shutdown")]
pub struct ShutdownReq {}
