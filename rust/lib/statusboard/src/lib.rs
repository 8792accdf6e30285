//! Status board BFF: the state and requests the mobile shells see.
//!
//! Structure:
//! - `bff/dsl/state/`: state types, one per well-known path
//! - `bff/dsl/request/`: request payloads, one per request path
//! - `bff/src/`: the `StatusBoard` context, handlers and Flux wiring
//!
//! A host builds a [`StatusBoard`] from its collaborators (or from an
//! [`AppConfig`](statusboard_core::AppConfig)), registers it on a
//! [`Flux`](flux::Flux) and emits `app/initialize`.

// BFF state types: flat access as `crate::state::*`.
#[path = "../bff/dsl/state/mod.rs"]
pub mod state;

// BFF request types: flat access as `crate::request::*`.
#[path = "../bff/dsl/request/mod.rs"]
pub mod request;

// Handler implementations + Flux wiring.
#[path = "../bff/src/mod.rs"]
pub mod handlers;

pub use handlers::{register_handlers, BoardSettings, Collaborators, StatusBoard};
