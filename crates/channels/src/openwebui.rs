//! Open WebUI channel adapter.
//!
//! Outbound posts and history reads go over the REST API. Inbound events
//! are injected by the relay (see [`crate::relay`]) into the stream handed
//! out by [`Channel::start`].

use async_trait::async_trait;
use tokio::sync::mpsc;
use toaster_core::channel::{Channel, ChannelEvent, HistorySource, RawMessage};
use toaster_core::error::ChannelError;
use tracing::{debug, info, warn};

use crate::events::decode_history;

/// Open WebUI channel adapter.
pub struct OpenWebUiChannel {
    base_url: String,
    token: String,
    client: reqwest::Client,
    inject_tx: tokio::sync::Mutex<Option<mpsc::Sender<Result<ChannelEvent, ChannelError>>>>,
}

impl std::fmt::Debug for OpenWebUiChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWebUiChannel")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl OpenWebUiChannel {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
            inject_tx: tokio::sync::Mutex::new(None),
        }
    }

    pub fn from_config(config: &toaster_config::BotConfig) -> Self {
        Self::new(
            config.platform.base_url.clone(),
            config.platform.token.clone().unwrap_or_default(),
        )
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/api/v1/channels/{channel_id}/messages", self.base_url)
    }

    /// Push an inbound event into the running stream (called by the relay).
    pub async fn inject_event(&self, event: ChannelEvent) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(event))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Event stream closed".into()))
        } else {
            Err(ChannelError::ConnectionLost(
                "Open WebUI channel not started".into(),
            ))
        }
    }
}

#[async_trait]
impl Channel for OpenWebUiChannel {
    fn name(&self) -> &str {
        "openwebui"
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelEvent, ChannelError>>, ChannelError> {
        info!(base_url = %self.base_url, "Open WebUI channel starting");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<(), ChannelError> {
        let url = format!("{}/post", self.messages_url(channel_id));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: channel_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(channel_id, status, "Message post rejected");
            return Err(ChannelError::DeliveryFailed {
                channel: channel_id.to_string(),
                reason: format!("status {status}: {body}"),
            });
        }

        debug!(channel_id, content_len = content.len(), "Message posted");
        Ok(())
    }

    async fn send_typing(&self, channel_id: &str) -> Result<(), ChannelError> {
        // Typing rides the socket transport; REST has no endpoint for it.
        debug!(channel_id, "Typing signal");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Open WebUI channel stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(self.inject_tx.lock().await.is_some())
    }
}

#[async_trait]
impl HistorySource for OpenWebUiChannel {
    async fn fetch(
        &self,
        channel_id: &str,
        limit: usize,
        before_id: Option<&str>,
    ) -> Result<Vec<RawMessage>, ChannelError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(before) = before_id {
            query.push(("before", before.to_string()));
        }

        let history_err = |reason: String| ChannelError::HistoryFetch {
            channel: channel_id.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.messages_url(channel_id))
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(|e| history_err(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(history_err(format!("status {status}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| history_err(e.to_string()))?;

        let messages = decode_history(body).map_err(|e| history_err(e.to_string()))?;
        debug!(channel_id, fetched = messages.len(), "History fetched");
        Ok(messages)
    }
}
