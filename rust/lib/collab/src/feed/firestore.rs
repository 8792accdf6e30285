use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use statusboard_core::config::FirebaseConfig;
use statusboard_core::{Sink, StatusError, Subscription};

use super::codec::{decode_document, encode_post};
use super::{FeedEvent, FeedStore};
use crate::http;
use crate::model::{sort_newest_first, FeedQuery, NewPost, StatusPost};
use crate::token::TokenSource;

pub const DEFAULT_FIRESTORE_BASE: &str = "https://firestore.googleapis.com";

/// Feed store over the Firestore REST API.
///
/// Appends go through `:commit` so the server stamps `createdAt` and
/// rejects a second create of the same id. Subscriptions re-run the
/// ordered query every `poll_interval` and deliver only when the result
/// set changed.
pub struct FirestoreFeedStore {
    http: reqwest::Client,
    /// `projects/{project}/databases/(default)/documents`
    documents_root: String,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
    poll_interval: Duration,
}

impl FirestoreFeedStore {
    pub fn new(
        config: &FirebaseConfig,
        token_source: Arc<dyn TokenSource>,
        poll_interval: Duration,
    ) -> Self {
        Self::with_base(config, token_source, poll_interval, DEFAULT_FIRESTORE_BASE)
    }

    pub fn with_base(
        config: &FirebaseConfig,
        token_source: Arc<dyn TokenSource>,
        poll_interval: Duration,
        base_url: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            documents_root: format!("projects/{}/databases/(default)/documents", config.project_id),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_source,
            poll_interval,
        }
    }

    fn poller(&self) -> Poller {
        Poller {
            http: self.http.clone(),
            url: format!("{}/v1/{}:runQuery", self.base_url, self.documents_root),
            token_source: Arc::clone(&self.token_source),
        }
    }
}

#[async_trait]
impl FeedStore for FirestoreFeedStore {
    async fn append(&self, collection: &str, post: NewPost) -> Result<String, StatusError> {
        let id = post.id.clone();
        let body = serde_json::json!({
            "writes": [{
                "update": {
                    "name": format!("{}/{}/{}", self.documents_root, collection, id),
                    "fields": encode_post(&post)?,
                },
                "updateTransforms": [{
                    "fieldPath": "createdAt",
                    "setToServerValue": "REQUEST_TIME",
                }],
                "currentDocument": { "exists": false },
            }]
        });
        let url = format!("{}/v1/{}:commit", self.base_url, self.documents_root);
        let req = authed(self.http.post(&url), self.token_source.as_ref()).await?;
        let resp = req.json(&body).send().await?;
        tracing::debug!(%id, status = resp.status().as_u16(), "commit");

        match http::check(resp).await {
            Ok(_) => Ok(id),
            Err(StatusError::Server { status, message })
                if status == 409 || message.contains("ALREADY_EXISTS") =>
            {
                tracing::debug!(%id, "document already exists, treating as created");
                Ok(id)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self, query: FeedQuery, sink: Sink<FeedEvent>) -> Subscription {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                sink(&Err(StatusError::Internal(
                    "feed subscription needs a tokio runtime".into(),
                )));
                return Subscription::detached();
            }
        };
        let poller = self.poller();
        let interval = self.poll_interval;
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<Vec<StatusPost>> = None;
            loop {
                ticker.tick().await;
                match poller.run(&query).await {
                    Ok(posts) => {
                        if last.as_ref() != Some(&posts) {
                            sink(&Ok(posts.clone()));
                            last = Some(posts);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "feed query failed");
                        last = None;
                        sink(&Err(e));
                    }
                }
            }
        });
        Subscription::new(move || task.abort())
    }
}

/// The part of the store a polling task needs to own.
struct Poller {
    http: reqwest::Client,
    url: String,
    token_source: Arc<dyn TokenSource>,
}

impl Poller {
    async fn run(&self, query: &FeedQuery) -> Result<Vec<StatusPost>, StatusError> {
        let mut structured = serde_json::json!({
            "from": [{ "collectionId": query.collection }],
            "orderBy": [{
                "field": { "fieldPath": "createdAt" },
                "direction": "DESCENDING",
            }],
        });
        if let Some(limit) = query.limit {
            structured["limit"] = Value::from(limit);
        }
        let req = authed(self.http.post(&self.url), self.token_source.as_ref()).await?;
        let resp = req
            .json(&serde_json::json!({ "structuredQuery": structured }))
            .send()
            .await?;
        let rows: Vec<Value> = http::parse(resp).await?;

        let mut posts: Vec<StatusPost> = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .filter_map(|doc| match decode_document(doc) {
                Ok(post) => Some(post),
                Err(e) => {
                    let name = doc.get("name").and_then(Value::as_str).unwrap_or("?");
                    tracing::warn!(%name, error = %e, "skipping undecodable document");
                    None
                }
            })
            .collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }
}

async fn authed(
    builder: reqwest::RequestBuilder,
    token_source: &dyn TokenSource,
) -> Result<reqwest::RequestBuilder, StatusError> {
    match token_source.token().await? {
        Some(token) => Ok(builder.bearer_auth(token)),
        None => Ok(builder),
    }
}
