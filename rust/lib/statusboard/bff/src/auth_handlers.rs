//! Sign-in, sign-up and sign-out.

use flux::StateStore;
use statusboard_core::StatusError;

use super::helpers::{MSG_ACCOUNT_CREATED, MSG_FILL_ALL_FIELDS};
use super::StatusBoard;
use crate::request::*;
use crate::state::*;

pub async fn handle_sign_in(req: &SignInReq, store: &StateStore, ctx: &StatusBoard) {
    authenticate(AuthMode::SignIn, &req.email, &req.password, store, ctx).await;
}

pub async fn handle_sign_up(req: &SignUpReq, store: &StateStore, ctx: &StatusBoard) {
    authenticate(AuthMode::SignUp, &req.email, &req.password, store, ctx).await;
}

/// Submit the auth form in whichever mode it currently shows.
pub async fn handle_submit(req: &SubmitAuthReq, store: &StateStore, ctx: &StatusBoard) {
    let mode = store
        .get_as::<AuthState>(AuthState::PATH)
        .map(|s| s.mode)
        .unwrap_or(AuthMode::SignIn);
    authenticate(mode, &req.email, &req.password, store, ctx).await;
}

pub async fn handle_sign_out(store: &StateStore, ctx: &StatusBoard) {
    if let Err(e) = ctx.identity().sign_out().await {
        tracing::warn!(error = %e, "sign out failed");
        store.update(AuthState::PATH, AuthState::loading, |s| {
            s.error = Some(e.to_string());
        });
    }
}

pub fn handle_toggle_mode(store: &StateStore) {
    store.update(AuthState::PATH, AuthState::loading, |s| {
        s.mode = match s.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        s.error = None;
        s.notice = None;
    });
}

async fn authenticate(
    mode: AuthMode,
    email: &str,
    password: &str,
    store: &StateStore,
    ctx: &StatusBoard,
) {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        store.update(AuthState::PATH, AuthState::loading, |s| {
            s.error = Some(MSG_FILL_ALL_FIELDS.into());
            s.notice = None;
        });
        return;
    }

    let claimed = store.update_if(AuthState::PATH, AuthState::loading, |s| {
        if s.busy {
            return false;
        }
        s.busy = true;
        s.error = None;
        s.notice = None;
        true
    });
    if !claimed {
        tracing::debug!("auth request already in flight");
        return;
    }

    let result: Result<_, StatusError> = match mode {
        AuthMode::SignIn => ctx.identity().sign_in(email, password).await,
        AuthMode::SignUp => ctx.identity().sign_up(email, password).await,
    };

    match result {
        Ok(user) => {
            tracing::info!(uid = %user.uid, ?mode, "authenticated");
            store.update(AuthState::PATH, AuthState::loading, |s| {
                s.busy = false;
                s.phase = AuthPhase::Authenticated;
                s.user = Some(user);
                if mode == AuthMode::SignUp {
                    s.notice = Some(MSG_ACCOUNT_CREATED.into());
                }
            });
            store.set(AppRoute::PATH, AppRoute::feed());
        }
        Err(e) => {
            tracing::warn!(error = %e, ?mode, "authentication failed");
            store.update(AuthState::PATH, AuthState::loading, |s| {
                s.busy = false;
                s.error = Some(e.to_string());
            });
        }
    }
}
