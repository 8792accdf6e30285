use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statusboard_core::config::FirebaseConfig;
use statusboard_core::{Sink, Sinks, StatusError, Subscription};

use super::{auth_error, AuthEvent, Identity};
use crate::model::UserIdentity;
use crate::token::TokenSource;

pub const DEFAULT_AUTH_BASE: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_BASE: &str = "https://securetoken.googleapis.com";

/// Hosted identity over the Identity Toolkit REST API.
///
/// The refresh token and profile are cached on disk so a restart
/// restores the session. ID tokens are minted lazily from the refresh
/// token and re-minted 30 s before they expire.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    api_key: String,
    auth_base: String,
    token_base: String,
    cache_path: Option<PathBuf>,
    session: tokio::sync::RwLock<Option<Session>>,
    current: RwLock<Option<UserIdentity>>,
    sinks: Sinks<AuthEvent>,
}

struct Session {
    user: UserIdentity,
    id_token: String,
    refresh_token: String,
    /// Absolute expiry (seconds since epoch). Zero forces a refresh.
    expires_at: i64,
}

/// On-disk session cache.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedSession {
    uid: String,
    email: String,
    refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentity {
    /// Build against the hosted endpoints, restoring any cached session.
    pub fn new(config: &FirebaseConfig, cache_path: Option<PathBuf>) -> Self {
        Self::with_endpoints(config, cache_path, DEFAULT_AUTH_BASE, DEFAULT_TOKEN_BASE)
    }

    pub fn with_endpoints(
        config: &FirebaseConfig,
        cache_path: Option<PathBuf>,
        auth_base: &str,
        token_base: &str,
    ) -> Self {
        let restored = cache_path.as_ref().and_then(|p| read_cache(p));
        let current = restored.as_ref().map(|s| s.user.clone());
        if let Some(user) = &current {
            tracing::info!(uid = %user.uid, "restored cached session");
        }
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            auth_base: auth_base.trim_end_matches('/').to_string(),
            token_base: token_base.trim_end_matches('/').to_string(),
            cache_path,
            session: tokio::sync::RwLock::new(restored),
            current: RwLock::new(current),
            sinks: Sinks::new(),
        }
    }

    /// A valid ID token for the signed-in user, refreshing if needed.
    pub async fn id_token(&self) -> Result<String, StatusError> {
        // Fast path: read lock.
        {
            let guard = self.session.read().await;
            match guard.as_ref() {
                None => return Err(StatusError::Unauthenticated("Not signed in".into())),
                Some(s) if chrono::Utc::now().timestamp() < s.expires_at => {
                    return Ok(s.id_token.clone());
                }
                Some(_) => {}
            }
        }

        // Slow path: write lock, re-check, refresh.
        let mut guard = self.session.write().await;
        let refresh_token = match guard.as_ref() {
            None => return Err(StatusError::Unauthenticated("Not signed in".into())),
            Some(s) if chrono::Utc::now().timestamp() < s.expires_at => {
                return Ok(s.id_token.clone());
            }
            Some(s) => s.refresh_token.clone(),
        };

        match self.refresh(&refresh_token).await {
            Ok(fresh) => {
                let token = fresh.id_token.clone();
                if let Some(session) = guard.as_mut() {
                    session.id_token = fresh.id_token;
                    session.refresh_token = fresh.refresh_token;
                    session.expires_at = expiry(&fresh.expires_in);
                    self.write_cache(session).await;
                }
                Ok(token)
            }
            Err(err @ StatusError::Unauthenticated(_)) => {
                // Refresh token revoked: the session is gone.
                *guard = None;
                drop(guard);
                self.remove_cache().await;
                self.set_current(None);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, StatusError> {
        let url = format!("{}/v1/token?key={}", self.token_base, self.api_key);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            }))
            .send()
            .await?;
        tracing::debug!(status = resp.status().as_u16(), "token refresh");
        if !resp.status().is_success() {
            return Err(map_error(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| StatusError::Decode(format!("token response: {}", e)))
    }

    async fn account_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, StatusError> {
        let url = format!("{}/v1/accounts:{}?key={}", self.auth_base, method, self.api_key);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;
        tracing::debug!(method, status = resp.status().as_u16(), "identity call");
        if !resp.status().is_success() {
            return Err(map_error(resp).await);
        }
        let body: AuthResponse = resp
            .json()
            .await
            .map_err(|e| StatusError::Decode(format!("{} response: {}", method, e)))?;

        let user = UserIdentity {
            uid: body.local_id,
            email: body.email.unwrap_or_else(|| email.to_string()),
        };
        let session = Session {
            user: user.clone(),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: expiry(&body.expires_in),
        };
        self.write_cache(&session).await;
        *self.session.write().await = Some(session);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    fn set_current(&self, user: Option<UserIdentity>) {
        {
            let mut current = self.current.write().expect("identity poisoned");
            *current = user.clone();
        }
        self.sinks.emit(&user);
    }

    async fn write_cache(&self, session: &Session) {
        let Some(path) = &self.cache_path else { return };
        let cached = CachedSession {
            uid: session.user.uid.clone(),
            email: session.user.email.clone(),
            refresh_token: session.refresh_token.clone(),
        };
        let result = async {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let body = serde_json::to_vec_pretty(&cached).map_err(std::io::Error::other)?;
            tokio::fs::write(path, body).await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "could not write session cache");
        }
    }

    async fn remove_cache(&self) {
        let Some(path) = &self.cache_path else { return };
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not remove session cache");
            }
        }
    }
}

#[async_trait]
impl Identity for FirebaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, StatusError> {
        self.account_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, StatusError> {
        self.account_call("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<(), StatusError> {
        *self.session.write().await = None;
        self.remove_cache().await;
        self.set_current(None);
        tracing::info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<UserIdentity> {
        self.current.read().expect("identity poisoned").clone()
    }

    fn on_auth_state_changed(&self, sink: Sink<AuthEvent>) -> Subscription {
        let sub = self.sinks.add(Arc::clone(&sink));
        sink(&self.current_user());
        sub
    }
}

#[async_trait]
impl TokenSource for FirebaseIdentity {
    async fn token(&self) -> Result<Option<String>, StatusError> {
        self.id_token().await.map(Some)
    }
}

fn read_cache(path: &Path) -> Option<Session> {
    let bytes = std::fs::read(path).ok()?;
    match serde_json::from_slice::<CachedSession>(&bytes) {
        Ok(cached) => Some(Session {
            user: UserIdentity {
                uid: cached.uid,
                email: cached.email,
            },
            id_token: String::new(),
            refresh_token: cached.refresh_token,
            expires_at: 0,
        }),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable session cache");
            None
        }
    }
}

/// `expires_in` arrives as a string of seconds. Expire 30 s early.
fn expiry(expires_in: &str) -> i64 {
    let secs: i64 = expires_in.trim().parse().unwrap_or(3600);
    chrono::Utc::now().timestamp() + secs - 30
}

async fn map_error(resp: reqwest::Response) -> StatusError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => auth_error(&env.error.message),
        Err(_) => StatusError::Server {
            status,
            message: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // =====================================================================
    // Fake identity service
    // =====================================================================

    async fn accounts(
        Path(call): Path<String>,
        Query(q): Query<HashMap<String, String>>,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        assert_eq!(q.get("key").map(String::as_str), Some("test-key"));
        let email = body["email"].as_str().unwrap_or_default().to_string();
        let password = body["password"].as_str().unwrap_or_default();
        let fail = |msg: &str| {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": {"code": 400, "message": msg}})),
            )
        };
        match call.as_str() {
            "accounts:signUp" if email == "taken@example.com" => fail("EMAIL_EXISTS"),
            "accounts:signInWithPassword" if password != "secret1" => fail("INVALID_PASSWORD"),
            _ => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "idToken": "id-1",
                    "refreshToken": "refresh-1",
                    "expiresIn": "3600",
                    "localId": "uid-1",
                    "email": email,
                })),
            ),
        }
    }

    async fn start_server(refreshes: Arc<AtomicUsize>, refresh_ok: bool) -> String {
        let app = Router::new().route("/v1/{call}", post(accounts)).route(
            "/token/v1/token",
            post(move |Json(body): Json<serde_json::Value>| {
                let refreshes = refreshes.clone();
                async move {
                    refreshes.fetch_add(1, Ordering::SeqCst);
                    if !refresh_ok {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({"error": {"code": 400, "message": "TOKEN_EXPIRED"}})),
                        );
                    }
                    assert_eq!(body["grant_type"], "refresh_token");
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({
                            "id_token": "id-2",
                            "refresh_token": "refresh-2",
                            "expires_in": "3600",
                            "user_id": "uid-1",
                        })),
                    )
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            api_key: "test-key".into(),
            project_id: "quickstatusboard".into(),
            ..Default::default()
        }
    }

    fn identity(base: &str, cache: Option<PathBuf>) -> FirebaseIdentity {
        FirebaseIdentity::with_endpoints(&config(), cache, base, &format!("{}/token", base))
    }

    // =====================================================================
    // Account calls
    // =====================================================================

    #[tokio::test]
    async fn sign_in_caches_session_and_notifies() {
        let base = start_server(Arc::new(AtomicUsize::new(0)), true).await;
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("session.json");
        let id = identity(&base, Some(cache.clone()));

        let events = Arc::new(Mutex::new(Vec::new()));
        let e = events.clone();
        let _sub = id.on_auth_state_changed(Arc::new(move |ev: &AuthEvent| {
            e.lock().unwrap().push(ev.clone());
        }));

        let user = id.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(user.uid, "uid-1");
        assert_eq!(id.id_token().await.unwrap(), "id-1");
        assert!(cache.exists());
        assert_eq!(*events.lock().unwrap(), vec![None, Some(user)]);

        id.sign_out().await.unwrap();
        assert!(!cache.exists());
        assert!(id.current_user().is_none());
    }

    #[tokio::test]
    async fn cached_session_survives_restart() {
        let base = start_server(Arc::new(AtomicUsize::new(0)), true).await;
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("nested").join("session.json");

        let first = identity(&base, Some(cache.clone()));
        first.sign_up("b@example.com", "secret1").await.unwrap();
        let cached: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&cache).await.unwrap()).unwrap();
        assert_eq!(cached["refreshToken"], "refresh-1");

        let second = identity(&base, Some(cache.clone()));
        assert_eq!(second.current_user().unwrap().email, "b@example.com");

        // Signing out twice leaves nothing behind and never fails.
        second.sign_out().await.unwrap();
        second.sign_out().await.unwrap();
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn backend_errors_map_to_messages() {
        let base = start_server(Arc::new(AtomicUsize::new(0)), true).await;
        let id = identity(&base, None);

        let err = id.sign_up("taken@example.com", "secret1").await.unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
        let err = id.sign_in("a@example.com", "nope").await.unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
        assert!(id.current_user().is_none());
    }

    // =====================================================================
    // Session restore + refresh
    // =====================================================================

    #[tokio::test]
    async fn restored_session_refreshes_token_once() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let base = start_server(refreshes.clone(), true).await;
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("session.json");
        std::fs::write(
            &cache,
            r#"{"uid":"uid-1","email":"a@example.com","refreshToken":"refresh-1"}"#,
        )
        .unwrap();

        let id = identity(&base, Some(cache.clone()));
        assert_eq!(id.current_user().unwrap().email, "a@example.com");

        assert_eq!(id.token().await.unwrap(), Some("id-2".to_string()));
        assert_eq!(id.token().await.unwrap(), Some("id-2".to_string()));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        let cached = std::fs::read_to_string(&cache).unwrap();
        assert!(cached.contains("refresh-2"));
    }

    #[tokio::test]
    async fn revoked_refresh_token_signs_out() {
        let base = start_server(Arc::new(AtomicUsize::new(0)), false).await;
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("session.json");
        std::fs::write(
            &cache,
            r#"{"uid":"uid-1","email":"a@example.com","refreshToken":"stale"}"#,
        )
        .unwrap();

        let id = identity(&base, Some(cache.clone()));
        let err = id.id_token().await.unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
        assert!(id.current_user().is_none());
        assert!(!cache.exists());
    }

    #[tokio::test]
    async fn token_without_session_is_unauthenticated() {
        let id = identity("http://127.0.0.1:9", None);
        assert_eq!(id.id_token().await.unwrap_err().error_code(), "UNAUTHENTICATED");
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("session.json");
        std::fs::write(&cache, "{not json").unwrap();
        let id = identity("http://127.0.0.1:9", Some(cache));
        assert!(id.current_user().is_none());
    }
}
