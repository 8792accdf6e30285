//! Identity collaborator: accounts, sessions and the auth-state stream.

use async_trait::async_trait;
use statusboard_core::{Sink, StatusError, Subscription};

use crate::model::UserIdentity;

mod firebase;
mod memory;

pub use firebase::FirebaseIdentity;
pub use memory::MemoryIdentity;

/// Event delivered on every sign-in, sign-out or session loss.
/// `None` means nobody is signed in.
pub type AuthEvent = Option<UserIdentity>;

pub const MIN_PASSWORD_CHARS: usize = 6;

#[async_trait]
pub trait Identity: Send + Sync + 'static {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, StatusError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, StatusError>;

    async fn sign_out(&self) -> Result<(), StatusError>;

    /// The user of the current session, if any.
    fn current_user(&self) -> Option<UserIdentity>;

    /// Register for auth-state changes. The sink is called once with the
    /// current state on registration, then on every change.
    fn on_auth_state_changed(&self, sink: Sink<AuthEvent>) -> Subscription;
}

/// Map a backend auth error code (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`)
/// to a user-facing error.
pub(crate) fn auth_error(code: &str) -> StatusError {
    let key = code.split([' ', ':']).next().unwrap_or(code);
    match key {
        "INVALID_EMAIL" => StatusError::Rejected("The email address is badly formatted.".into()),
        "WEAK_PASSWORD" => StatusError::Rejected(format!(
            "Password should be at least {} characters",
            MIN_PASSWORD_CHARS
        )),
        "EMAIL_EXISTS" => StatusError::AlreadyExists(
            "The email address is already in use by another account.".into(),
        ),
        "EMAIL_NOT_FOUND" => StatusError::NotFound(
            "There is no user record corresponding to this identifier.".into(),
        ),
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => StatusError::Unauthenticated(
            "The password is invalid or the user does not have a password.".into(),
        ),
        "USER_DISABLED" => {
            StatusError::PermissionDenied("The user account has been disabled.".into())
        }
        "TOO_MANY_ATTEMPTS_TRY_LATER" => StatusError::Unavailable(
            "Too many unsuccessful attempts. Try again later.".into(),
        ),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            StatusError::Unauthenticated("Your session has expired. Please sign in again.".into())
        }
        other => StatusError::Server {
            status: 400,
            message: other.to_string(),
        },
    }
}

/// Loose shape check: one `@`, something before it, a dot after it.
pub(crate) fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("a@example.com"));
        assert!(looks_like_email("first.last@sub.example.org"));
        assert!(!looks_like_email("nope"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("a@@example.com"));
        assert!(!looks_like_email("a b@example.com"));
        assert!(!looks_like_email("a@example."));
    }

    #[test]
    fn backend_codes_map_to_errors() {
        assert_eq!(auth_error("EMAIL_EXISTS").error_code(), "ALREADY_EXISTS");
        assert_eq!(auth_error("EMAIL_NOT_FOUND").error_code(), "NOT_FOUND");
        assert_eq!(auth_error("INVALID_PASSWORD").error_code(), "UNAUTHENTICATED");
        assert_eq!(auth_error("INVALID_LOGIN_CREDENTIALS").error_code(), "UNAUTHENTICATED");
        let weak = auth_error("WEAK_PASSWORD : Password should be at least 6 characters");
        assert_eq!(weak.error_code(), "INVALID_ARGUMENT");
        assert_eq!(weak.to_string(), "Password should be at least 6 characters");
        assert_eq!(auth_error("SOMETHING_NEW").error_code(), "SERVER");
    }
}
