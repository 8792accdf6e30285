//! Global request definitions.
//!
//! Each struct is a typed request payload with a `PATH` const. Shells
//! that talk JSON go through [`decode`], which knows every path.

pub mod app;
pub mod auth;
pub mod compose;
pub mod enrichment;
pub mod feed;
pub mod status;

pub use app::{InitializeReq, ShutdownReq};
pub use auth::{SignInReq, SignOutReq, SignUpReq, SubmitAuthReq, ToggleAuthModeReq};
pub use compose::{ComposeUpdateReq, ToggleLocationReq, ToggleWeatherReq};
pub use enrichment::RefreshEnrichmentReq;
pub use feed::{CloseFeedReq, OpenFeedReq};
pub use status::PostStatusReq;

use std::sync::Arc;

use flux::Payload;
use statusboard_core::StatusError;

macro_rules! decoders {
    ($($req:ty),* $(,)?) => {
        /// Every request path, in registration order.
        pub const PATHS: &[&str] = &[$(<$req>::PATH),*];

        /// Decode a JSON request body for `path` into its typed payload.
        ///
        /// An empty body is read as `{}`.
        pub fn decode(path: &str, body: &str) -> Result<Payload, StatusError> {
            let body = if body.trim().is_empty() { "{}" } else { body };
            $(
                if path == <$req>::PATH {
                    let req: $req = serde_json::from_str(body)
                        .map_err(|e| StatusError::Decode(format!("{}: {}", path, e)))?;
                    return Ok(Arc::new(req));
                }
            )*
            Err(StatusError::NotFound(format!("unknown request path: {}", path)))
        }
    };
}

decoders!(
    InitializeReq,
    ShutdownReq,
    SignInReq,
    SignUpReq,
    SubmitAuthReq,
    SignOutReq,
    ToggleAuthModeReq,
    OpenFeedReq,
    CloseFeedReq,
    ComposeUpdateReq,
    ToggleLocationReq,
    ToggleWeatherReq,
    PostStatusReq,
    RefreshEnrichmentReq,
);
