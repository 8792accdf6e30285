use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use statusboard_core::{new_id, Sink, Sinks, StatusError, Subscription};

use super::{auth_error, looks_like_email, AuthEvent, Identity, MIN_PASSWORD_CHARS};
use crate::model::UserIdentity;

/// In-process identity backend. Used in demo mode (no backend
/// configured) and by tests. Enforces the same rules as the hosted
/// service: valid email, 6+ char password, unique email.
pub struct MemoryIdentity {
    state: Mutex<MemoryState>,
    sinks: Sinks<AuthEvent>,
    calls: AtomicUsize,
}

#[derive(Default)]
struct MemoryState {
    /// Lowercased email → account.
    accounts: HashMap<String, Account>,
    current: Option<UserIdentity>,
}

struct Account {
    uid: String,
    email: String,
    password: String,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            sinks: Sinks::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Pre-register an account without signing it in.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        {
            let mut state = self.state.lock().expect("identity poisoned");
            state.accounts.insert(
                email.to_lowercase(),
                Account {
                    uid: new_id(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
            );
        }
        self
    }

    /// Drop the session as if the backend revoked it, notifying listeners.
    pub fn expire_session(&self) {
        let changed = {
            let mut state = self.state.lock().expect("identity poisoned");
            state.current.take().is_some()
        };
        if changed {
            tracing::info!("session expired");
            self.sinks.emit(&None);
        }
    }

    /// Number of sign-up / sign-in / sign-out calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_current(&self, user: Option<UserIdentity>) {
        {
            let mut state = self.state.lock().expect("identity poisoned");
            state.current = user.clone();
        }
        self.sinks.emit(&user);
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Identity for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, StatusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !looks_like_email(email) {
            return Err(auth_error("INVALID_EMAIL"));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(auth_error("WEAK_PASSWORD"));
        }
        let user = {
            let mut state = self.state.lock().expect("identity poisoned");
            let key = email.to_lowercase();
            if state.accounts.contains_key(&key) {
                return Err(auth_error("EMAIL_EXISTS"));
            }
            let uid = new_id();
            state.accounts.insert(
                key,
                Account {
                    uid: uid.clone(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
            );
            UserIdentity {
                uid,
                email: email.to_string(),
            }
        };
        tracing::info!(uid = %user.uid, "account created");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, StatusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !looks_like_email(email) {
            return Err(auth_error("INVALID_EMAIL"));
        }
        let user = {
            let state = self.state.lock().expect("identity poisoned");
            let account = state
                .accounts
                .get(&email.to_lowercase())
                .ok_or_else(|| auth_error("EMAIL_NOT_FOUND"))?;
            if account.password != password {
                return Err(auth_error("INVALID_PASSWORD"));
            }
            UserIdentity {
                uid: account.uid.clone(),
                email: account.email.clone(),
            }
        };
        tracing::info!(uid = %user.uid, "signed in");
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), StatusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.set_current(None);
        Ok(())
    }

    fn current_user(&self) -> Option<UserIdentity> {
        self.state.lock().expect("identity poisoned").current.clone()
    }

    fn on_auth_state_changed(&self, sink: Sink<AuthEvent>) -> Subscription {
        let sub = self.sinks.add(Arc::clone(&sink));
        sink(&self.current_user());
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(identity: &MemoryIdentity) -> (Arc<Mutex<Vec<AuthEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = events.clone();
        let sub = identity.on_auth_state_changed(Arc::new(move |ev: &AuthEvent| {
            e.lock().unwrap().push(ev.clone());
        }));
        (events, sub)
    }

    // ========================================================================
    // Sign up
    // ========================================================================

    #[tokio::test]
    async fn sign_up_creates_and_signs_in() {
        let identity = MemoryIdentity::new();
        let user = identity.sign_up("a@example.com", "secret1").await.unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(identity.current_user(), Some(user));
    }

    #[tokio::test]
    async fn sign_up_rules() {
        let identity = MemoryIdentity::new().with_account("taken@example.com", "secret1");

        let err = identity.sign_up("not-an-email", "secret1").await.unwrap_err();
        assert_eq!(err.to_string(), "The email address is badly formatted.");

        let err = identity.sign_up("b@example.com", "12345").await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");

        let err = identity.sign_up("TAKEN@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        assert!(identity.current_user().is_none());
        assert_eq!(identity.call_count(), 3);
    }

    // ========================================================================
    // Sign in / out
    // ========================================================================

    #[tokio::test]
    async fn sign_in_checks_password_and_account() {
        let identity = MemoryIdentity::new().with_account("a@example.com", "secret1");

        let err = identity.sign_in("a@example.com", "wrong-pw").await.unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
        let err = identity.sign_in("ghost@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let user = identity.sign_in("A@example.com", "secret1").await.unwrap();
        assert_eq!(user.email, "a@example.com");
    }

    #[tokio::test]
    async fn listener_gets_current_then_changes() {
        let identity = MemoryIdentity::new().with_account("a@example.com", "secret1");
        let (events, _sub) = recorder(&identity);

        let user = identity.sign_in("a@example.com", "secret1").await.unwrap();
        identity.sign_out().await.unwrap();

        assert_eq!(*events.lock().unwrap(), vec![None, Some(user), None]);
    }

    #[tokio::test]
    async fn expire_session_notifies_once() {
        let identity = MemoryIdentity::new().with_account("a@example.com", "secret1");
        identity.sign_in("a@example.com", "secret1").await.unwrap();
        let (events, _sub) = recorder(&identity);

        identity.expire_session();
        identity.expire_session();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_some());
        assert!(events[1].is_none());
    }

    #[tokio::test]
    async fn dropped_listener_is_not_called() {
        let identity = MemoryIdentity::new().with_account("a@example.com", "secret1");
        let (events, sub) = recorder(&identity);
        drop(sub);

        identity.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(events.lock().unwrap().len(), 1);
    }
}
