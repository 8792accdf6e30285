//! HTTP plumbing shared by the REST collaborators.

use serde::de::DeserializeOwned;
use statusboard_core::StatusError;

/// Parse a JSON response, mapping non-2xx to `StatusError::Server`.
pub(crate) async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, StatusError> {
    let resp = check(resp).await?;
    resp.json::<R>()
        .await
        .map_err(|e| StatusError::Decode(format!("response body: {}", e)))
}

/// Pass 2xx responses through; turn anything else into `Server`.
pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, StatusError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StatusError::Server {
        status: status.as_u16(),
        message: body,
    })
}
