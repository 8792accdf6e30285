//! Feed subscription lifecycle.

use std::sync::Arc;

use chrono::Utc;
use flux::StateStore;
use statusboard_collab::{FeedEvent, FeedQuery};
use statusboard_core::Sink;

use super::helpers;
use super::StatusBoard;
use crate::state::*;

/// Open the feed. A second open while one is held does nothing.
pub fn handle_open(store: &Arc<StateStore>, ctx: &StatusBoard) {
    if helpers::current_user(store).is_none() {
        tracing::debug!("feed open ignored while signed out");
        return;
    }
    let query = FeedQuery::newest_first(&ctx.settings().collection);
    let opened = ctx.open_feed_with(|| {
        store.update(FeedState::PATH, FeedState::default, |s| {
            s.subscribed = true;
            s.loading = true;
            s.error = None;
        });
        ctx.feed().subscribe(query, feed_sink(Arc::clone(store)))
    });
    if opened {
        tracing::info!(collection = %ctx.settings().collection, "feed opened");
    } else {
        tracing::debug!("feed already open");
    }
}

pub fn handle_close(store: &StateStore, ctx: &StatusBoard) {
    if ctx.close_feed() {
        tracing::info!("feed closed");
    }
    if store.contains(FeedState::PATH) {
        store.update(FeedState::PATH, FeedState::default, |s| {
            s.subscribed = false;
            s.loading = false;
        });
    }
}

fn feed_sink(store: Arc<StateStore>) -> Sink<FeedEvent> {
    Arc::new(move |event: &FeedEvent| match event {
        Ok(posts) => {
            let items = helpers::feed_items(posts, Utc::now());
            tracing::debug!(count = items.len(), "feed snapshot");
            store.update(FeedState::PATH, FeedState::default, |s| {
                s.items = items;
                s.loading = false;
                s.error = None;
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "feed subscription error");
            store.update(FeedState::PATH, FeedState::default, |s| {
                s.loading = false;
                s.error = Some(e.to_string());
            });
        }
    })
}
