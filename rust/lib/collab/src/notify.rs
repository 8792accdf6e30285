//! Notification collaborator: local confirmations and remote push.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statusboard_core::config::NotificationConfig;
use statusboard_core::StatusError;

use crate::http;

/// Token returned when the device has not registered for push.
pub const PLACEHOLDER_PUSH_TOKEN: &str = "placeholder-token";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalNotification {
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn request_permission(&self) -> bool;

    /// Show a notification on this device.
    async fn fire_local(&self, notification: LocalNotification) -> Result<(), StatusError>;

    async fn push_token(&self) -> Option<String>;
}

/// Local notification sink: logs and records every notification. When a
/// push relay and device token are configured, each notification is also
/// relayed to the device.
pub struct LogNotifier {
    fired: Mutex<Vec<LocalNotification>>,
    relay: Option<(ExpoPushRelay, String)>,
    fail: bool,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            fired: Mutex::new(Vec::new()),
            relay: None,
            fail: false,
        }
    }

    /// Relay to the configured device when push is set up.
    pub fn from_config(config: &NotificationConfig) -> Self {
        let mut notifier = Self::new();
        let token = config.device_token.trim();
        if config.is_configured() && !token.is_empty() {
            notifier.relay = Some((ExpoPushRelay::new(&config.push_endpoint), token.to_string()));
        }
        notifier
    }

    /// A notifier whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Notifications shown so far, oldest first.
    pub fn fired(&self) -> Vec<LocalNotification> {
        self.fired.lock().expect("notifier poisoned").clone()
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn fire_local(&self, notification: LocalNotification) -> Result<(), StatusError> {
        if self.fail {
            return Err(StatusError::Unavailable("notifications unavailable".into()));
        }
        tracing::info!(title = %notification.title, body = %notification.body, "notification");
        if let Some((relay, token)) = &self.relay {
            relay
                .send(&PushMessage::new(token, &notification))
                .await?;
        }
        self.fired
            .lock()
            .expect("notifier poisoned")
            .push(notification);
        Ok(())
    }

    async fn push_token(&self) -> Option<String> {
        match &self.relay {
            Some((_, token)) => Some(token.clone()),
            None => Some(PLACEHOLDER_PUSH_TOKEN.to_string()),
        }
    }
}

/// Body accepted by the Expo push relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub sound: String,
}

impl PushMessage {
    pub fn new(to: &str, notification: &LocalNotification) -> Self {
        Self {
            to: to.to_string(),
            title: notification.title.clone(),
            body: notification.body.clone(),
            data: notification.data.clone(),
            sound: "default".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct PushReceipt {
    data: PushTicket,
}

#[derive(Deserialize)]
struct PushTicket {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// HTTPS client for the Expo push relay.
pub struct ExpoPushRelay {
    http: reqwest::Client,
    endpoint: String,
}

impl ExpoPushRelay {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub async fn send(&self, message: &PushMessage) -> Result<(), StatusError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .header("accept", "application/json")
            .json(message)
            .send()
            .await?;
        let receipt: PushReceipt = http::parse(resp).await?;
        if receipt.data.status != "ok" {
            return Err(StatusError::Rejected(
                receipt
                    .data
                    .message
                    .unwrap_or_else(|| "push relay rejected the message".into()),
            ));
        }
        tracing::debug!(to = %message.to, "push relayed");
        Ok(())
    }
}
