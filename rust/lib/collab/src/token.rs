//! Bearer tokens for the document store.

use async_trait::async_trait;
use statusboard_core::StatusError;

/// Pluggable token provider, asked before every authenticated request.
///
/// Implementations handle acquisition, caching and refresh.
/// `Ok(None)` sends the request without an Authorization header.
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, StatusError>;
}

/// A token obtained elsewhere.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, StatusError> {
        Ok(Some(self.0.clone()))
    }
}
