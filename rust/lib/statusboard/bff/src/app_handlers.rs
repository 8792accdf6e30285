//! App lifecycle: initialize and shutdown.

use std::sync::{Arc, Weak};

use flux::StateStore;
use statusboard_collab::AuthEvent;
use statusboard_core::Sink;

use super::StatusBoard;
use crate::state::*;

/// Seed the screens and start following the identity collaborator.
///
/// Re-initializing replaces the previous session listener.
pub async fn handle_initialize(store: &Arc<StateStore>, ctx: &Arc<StatusBoard>) {
    store.set(AuthState::PATH, AuthState::loading());
    store.set(AppRoute::PATH, AppRoute::loading());
    store.set(ComposeState::PATH, ComposeState::empty());

    ctx.replace_session(None);
    let sink = session_sink(Arc::clone(store), Arc::downgrade(ctx));
    let sub = ctx.identity().on_auth_state_changed(sink);
    ctx.replace_session(Some(sub));

    let granted = ctx.notifier().request_permission().await;
    let token = ctx.notifier().push_token().await;
    tracing::debug!(granted, token = token.as_deref().unwrap_or(""), "notifications ready");
}

/// Release every live subscription and clear the session.
pub async fn handle_shutdown(store: &Arc<StateStore>, ctx: &Arc<StatusBoard>) {
    ctx.close_feed();
    ctx.replace_session(None);
    store.remove(FeedState::PATH);
    store.remove(EnrichmentState::PATH);
    store.remove(AuthState::PATH);
    store.set(AppRoute::PATH, AppRoute::loading());
    tracing::info!("status board shut down");
}

fn session_sink(store: Arc<StateStore>, ctx: Weak<StatusBoard>) -> Sink<AuthEvent> {
    Arc::new(move |event: &AuthEvent| {
        let ctx = ctx.upgrade();
        apply_auth_event(&store, ctx.as_deref(), event);
    })
}

/// Route the UI from an auth-state event.
pub(crate) fn apply_auth_event(store: &StateStore, ctx: Option<&StatusBoard>, event: &AuthEvent) {
    match event {
        Some(user) => {
            tracing::info!(uid = %user.uid, "session active");
            store.update(AuthState::PATH, AuthState::loading, |s| {
                s.phase = AuthPhase::Authenticated;
                s.user = Some(user.clone());
            });
            store.set(AppRoute::PATH, AppRoute::feed());
        }
        None => {
            let was_signed_in = store
                .get_as::<AuthState>(AuthState::PATH)
                .map(|s| s.is_authenticated())
                .unwrap_or(false);
            if was_signed_in {
                tracing::info!("session ended");
            }
            if let Some(ctx) = ctx {
                ctx.close_feed();
            }
            store.remove(FeedState::PATH);
            store.remove(EnrichmentState::PATH);
            store.set(ComposeState::PATH, ComposeState::empty());
            store.update(AuthState::PATH, AuthState::loading, |s| {
                s.phase = AuthPhase::Anonymous;
                s.user = None;
                s.busy = false;
            });
            store.set(AppRoute::PATH, AppRoute::auth());
        }
    }
}
