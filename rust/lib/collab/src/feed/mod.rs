//! Feed store collaborator: append one post, watch the ordered feed.

use async_trait::async_trait;
use statusboard_core::{Sink, StatusError, Subscription};

use crate::model::{FeedQuery, NewPost, StatusPost};

mod codec;
mod firestore;
mod memory;

pub use firestore::FirestoreFeedStore;
pub use memory::MemoryFeedStore;

/// One notification on a feed subscription: the full ordered result set,
/// or the error that prevented producing it.
pub type FeedEvent = Result<Vec<StatusPost>, StatusError>;

#[async_trait]
pub trait FeedStore: Send + Sync + 'static {
    /// Append a post under its client-chosen id and return the id.
    ///
    /// Appending an id that already exists is not an error: the existing
    /// document is kept and its id returned.
    async fn append(&self, collection: &str, post: NewPost) -> Result<String, StatusError>;

    /// Watch a query. The sink receives the whole result set, newest
    /// first, each time it changes; errors are delivered to the same sink
    /// and do not end the subscription.
    fn subscribe(&self, query: FeedQuery, sink: Sink<FeedEvent>) -> Subscription;
}
