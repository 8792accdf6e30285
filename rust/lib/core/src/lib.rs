pub mod config;
pub mod error;
pub mod subscription;
pub mod types;

pub use config::AppConfig;
pub use error::StatusError;
pub use subscription::{Sink, Sinks, Subscription};
pub use types::{format_relative, new_id, now_rfc3339};
