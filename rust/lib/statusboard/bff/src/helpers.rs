//! Shared helpers and user-facing strings.

use chrono::{DateTime, Utc};
use flux::StateStore;
use statusboard_collab::{sort_newest_first, StatusPost, UserIdentity};
use statusboard_core::{format_relative, StatusError};

use crate::state::*;

pub const MSG_EMPTY_STATUS: &str = "Please enter a status";
pub const MSG_FILL_ALL_FIELDS: &str = "Please fill in all fields";
pub const MSG_ACCOUNT_CREATED: &str = "Account created successfully!";
pub const MSG_SIGN_IN_TO_POST: &str = "Please sign in to post";
pub const MSG_POSTED: &str = "Status posted";
pub const NOTIFY_POSTED_TITLE: &str = "Status Posted!";
pub const NOTIFY_POSTED_BODY: &str = "Your status has been shared successfully";

/// The signed-in user from `auth/state`.
pub fn current_user(store: &StateStore) -> Option<UserIdentity> {
    store
        .get(AuthState::PATH)
        .and_then(|v| v.downcast_ref::<AuthState>().and_then(|a| a.user.clone()))
}

/// Trim and check a status. Returns the text to store.
pub fn validate_content(content: &str, max_chars: usize) -> Result<String, StatusError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(StatusError::Validation(MSG_EMPTY_STATUS.into()));
    }
    if max_chars > 0 && trimmed.chars().count() > max_chars {
        return Err(StatusError::Validation(format!(
            "Status must be {} characters or fewer",
            max_chars
        )));
    }
    Ok(trimmed.to_string())
}

pub fn post_to_item(post: &StatusPost, now: DateTime<Utc>) -> FeedItem {
    FeedItem {
        id: post.id.clone(),
        content: post.content.clone(),
        author_id: post.author_id.clone(),
        author_email: post.author_email.clone(),
        created_at: post.created_at,
        time_label: format_relative(post.created_at, now),
        location: post.location.clone(),
        coordinates: post.coordinates,
        weather: post.weather.clone(),
    }
}

/// Feed items for a snapshot, newest first.
pub fn feed_items(posts: &[StatusPost], now: DateTime<Utc>) -> Vec<FeedItem> {
    let mut posts = posts.to_vec();
    sort_newest_first(&mut posts);
    posts.iter().map(|p| post_to_item(p, now)).collect()
}
