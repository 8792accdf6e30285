use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Shells match on these,
// never on the human-readable message string.

/// Stable error code constants.
///
/// Mobile shells receive `{"code": "VALIDATION_FAILED", "message": "..."}`
/// across the FFI boundary. Codes never change; messages may be reworded.
pub mod error_code {
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NETWORK: &str = "NETWORK";
    pub const SERVER: &str = "SERVER";
    pub const DECODE: &str = "DECODE";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── StatusError ─────────────────────────────────────────────────────

/// Unified error type shared by every collaborator and handler.
///
/// Validation errors never reach a collaborator. Everything else is a
/// collaborator failure caught at its call site and surfaced once to the
/// user; nothing here is retried.
#[derive(Error, Debug, Clone)]
pub enum StatusError {
    /// Input rejected locally (empty post, missing credentials, ...).
    #[error("{0}")]
    Validation(String),

    /// A collaborator refused the input (malformed email, weak password).
    #[error("{0}")]
    Rejected(String),

    /// Credentials rejected or no signed-in user.
    #[error("{0}")]
    Unauthenticated(String),

    /// A device capability or backend rule refused the operation.
    #[error("{0}")]
    PermissionDenied(String),

    /// The resource (account, document id) already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Transport-level failure talking to a collaborator.
    #[error("network: {0}")]
    Network(String),

    /// Collaborator answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// Collaborator answered with a body we could not understand.
    #[error("decode: {0}")]
    Decode(String),

    /// Collaborator is not configured or not reachable in this build.
    #[error("{0}")]
    Unavailable(String),

    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl StatusError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            StatusError::Validation(_) => error_code::VALIDATION_FAILED,
            StatusError::Rejected(_) => error_code::INVALID_ARGUMENT,
            StatusError::Unauthenticated(_) => error_code::UNAUTHENTICATED,
            StatusError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            StatusError::AlreadyExists(_) => error_code::ALREADY_EXISTS,
            StatusError::NotFound(_) => error_code::NOT_FOUND,
            StatusError::Network(_) => error_code::NETWORK,
            StatusError::Server { .. } => error_code::SERVER,
            StatusError::Decode(_) => error_code::DECODE,
            StatusError::Unavailable(_) => error_code::UNAVAILABLE,
            StatusError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// True for errors raised before any collaborator was contacted.
    pub fn is_local(&self) -> bool {
        matches!(self, StatusError::Validation(_))
    }

    /// JSON body handed to shells: `{"code": ..., "message": ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        })
    }
}

impl From<reqwest::Error> for StatusError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StatusError::Decode(e.to_string())
        } else {
            StatusError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StatusError {
    fn from(e: serde_json::Error) -> Self {
        StatusError::Decode(e.to_string())
    }
}
