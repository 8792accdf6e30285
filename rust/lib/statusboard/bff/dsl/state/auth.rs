//! Session state: stored at `auth/state`.

use flux_derive::state;
use serde::{Deserialize, Serialize};
use statusboard_collab::UserIdentity;

/// The session as the UI sees it.
///
/// `Loading` until the identity collaborator reports for the first time,
/// then `Authenticated` or `Anonymous`.
#[state("auth/state")]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub phase: AuthPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
    pub mode: AuthMode,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One-shot success message ("Account created successfully!").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthPhase {
    Loading,
    Anonymous,
    Authenticated,
}

/// Which form the auth screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            phase: AuthPhase::Loading,
            user: None,
            mode: AuthMode::SignIn,
            busy: false,
            error: None,
            notice: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated && self.user.is_some()
    }
}
