//! Flux: the status board state engine.
//!
//! A path-based state machine with pub/sub. Rust owns the session, the
//! feed and the compose draft; each mobile shell only renders what it
//! reads and emits requests back.
//!
//! # Three Primitives
//!
//! - `get(path)`: read state at a path, Arc zero-copy
//! - `emit(path, payload)`: send a request, routed to handler(s)
//! - `subscribe(pattern)`: observe state changes
//!
//! # Path Addressing
//!
//! State and requests share one flat namespace with `/` as separator:
//! `auth/state`, `app/route`, `feed/state`, `compose/state`.
//!
//! Both subscriptions and handlers accept MQTT-style wildcards: `+` for
//! one level, `#` for the rest (`feed/#`, or `#` for everything).

pub mod app;
pub mod pattern;
pub mod router;
pub mod store;
pub mod value;

pub use app::Flux;
pub use pattern::TopicPattern;
pub use router::{BoxFuture, Payload, Router};
pub use statusboard_core::Subscription;
pub use store::{ChangeHandler, StateStore};
pub use value::StateValue;
