use chrono::{DateTime, Utc};

/// Generate a new random ID (UUIDv4, no dashes).
///
/// Used as the client-side document id for a post, so a retried append
/// of the same submission lands on the same document.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Relative-time label for a post.
///
/// `None` means the server timestamp has not been assigned yet; the post
/// was just written and renders as "Just now". Clock skew that places
/// `created_at` in the future also renders as "Just now".
pub fn format_relative(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created_at) = created_at else {
        return "Just now".to_string();
    };
    let secs = (now - created_at).num_seconds();
    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        plural(secs / 60, "minute")
    } else if secs < 86_400 {
        plural(secs / 3600, "hour")
    } else {
        plural(secs / 86_400, "day")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
