//! Global state definitions.
//!
//! Each file defines one state type stored at a well-known path.

pub mod app;
pub mod auth;
pub mod compose;
pub mod enrichment;
pub mod feed;

pub use app::AppRoute;
pub use auth::{AuthMode, AuthPhase, AuthState};
pub use compose::ComposeState;
pub use enrichment::EnrichmentState;
pub use feed::{FeedItem, FeedState};
