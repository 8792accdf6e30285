use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use statusboard_core::{Sink, Sinks, StatusError, Subscription};

use super::{FeedEvent, FeedStore};
use crate::model::{sort_newest_first, FeedQuery, NewPost, StatusPost};

/// In-process feed store with push notification, for demo mode and tests.
///
/// Timestamps are assigned from the local clock at append time. Failure
/// switches let tests drive the error paths.
pub struct MemoryFeedStore {
    state: Mutex<MemoryFeed>,
    changes: Sinks<FeedChange>,
    appends: AtomicUsize,
}

#[derive(Default)]
struct MemoryFeed {
    collections: HashMap<String, Vec<StatusPost>>,
    fail_appends: Option<String>,
    /// Store the next append but report a network failure.
    lose_next_ack: bool,
}

struct FeedChange {
    collection: String,
    event: FeedEvent,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryFeed::default()),
            changes: Sinks::new(),
            appends: AtomicUsize::new(0),
        }
    }

    /// Insert a post as-is (timestamp included) and notify watchers.
    pub fn insert(&self, collection: &str, post: StatusPost) {
        let posts = {
            let mut state = self.state.lock().expect("feed poisoned");
            let posts = state.collections.entry(collection.to_string()).or_default();
            posts.retain(|p| p.id != post.id);
            posts.push(post);
            posts.clone()
        };
        self.publish(collection, Ok(posts));
    }

    /// Make every append fail with a network error until cleared.
    pub fn fail_appends(&self, message: Option<&str>) {
        self.state.lock().expect("feed poisoned").fail_appends = message.map(str::to_string);
    }

    /// The next append is stored but the caller sees a network failure.
    pub fn lose_next_ack(&self) {
        self.state.lock().expect("feed poisoned").lose_next_ack = true;
    }

    /// Deliver an error to every watcher of `collection`.
    pub fn push_error(&self, collection: &str, error: StatusError) {
        self.changes.emit(&FeedChange {
            collection: collection.to_string(),
            event: Err(error),
        });
    }

    /// Stored posts in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<StatusPost> {
        let state = self.state.lock().expect("feed poisoned");
        state.collections.get(collection).cloned().unwrap_or_default()
    }

    /// Number of append calls received, failed ones included.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.len()
    }

    fn publish(&self, collection: &str, event: FeedEvent) {
        self.changes.emit(&FeedChange {
            collection: collection.to_string(),
            event,
        });
    }
}

impl Default for MemoryFeedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn append(&self, collection: &str, post: NewPost) -> Result<String, StatusError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        let id = post.id.clone();
        let (posts, lost) = {
            let mut state = self.state.lock().expect("feed poisoned");
            if let Some(message) = &state.fail_appends {
                return Err(StatusError::Network(message.clone()));
            }
            let lost = std::mem::take(&mut state.lose_next_ack);
            let posts = state.collections.entry(collection.to_string()).or_default();
            if posts.iter().any(|p| p.id == id) {
                tracing::debug!(%id, "append of existing id, keeping original");
                return Ok(id);
            }
            posts.push(post.into_post(Some(Utc::now())));
            (posts.clone(), lost)
        };
        tracing::debug!(%id, collection, "appended");
        self.publish(collection, Ok(posts));
        if lost {
            return Err(StatusError::Network("connection reset before acknowledgment".into()));
        }
        Ok(id)
    }

    fn subscribe(&self, query: FeedQuery, sink: Sink<FeedEvent>) -> Subscription {
        let deliver = {
            let query = query.clone();
            move |event: &FeedEvent| match event {
                Ok(posts) => sink(&Ok(ordered(posts.clone(), &query))),
                Err(e) => sink(&Err(e.clone())),
            }
        };
        let deliver = Arc::new(deliver);
        let initial = self.documents(&query.collection);
        let forward = Arc::clone(&deliver);
        let collection = query.collection.clone();
        let sub = self.changes.add(Arc::new(move |change: &FeedChange| {
            if change.collection == collection {
                forward(&change.event);
            }
        }));
        deliver(&Ok(initial));
        sub
    }
}

fn ordered(mut posts: Vec<StatusPost>, query: &FeedQuery) -> Vec<StatusPost> {
    sort_newest_first(&mut posts);
    if let Some(limit) = query.limit {
        posts.truncate(limit);
    }
    posts
}
