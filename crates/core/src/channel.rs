//! Channel traits: the abstraction over the chat platform.
//!
//! A [`Channel`] delivers inbound events and accepts outbound messages and
//! typing signals. A [`HistorySource`] serves the platform's own record of
//! recent channel messages, newest first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::message::Speaker;

/// A reaction as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReaction {
    pub name: String,
    pub count: u32,
    /// Accounts that reacted. They may never have spoken in the batch.
    #[serde(default)]
    pub account_ids: Vec<String>,
}

/// A platform message as fetched from history or received live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub author: Speaker,
    pub text: String,
    /// Platform timestamp; larger is newer.
    pub created_at: i64,
    #[serde(default)]
    pub reactions: Vec<RawReaction>,
}

/// A live message that arrived in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel_id: String,
    pub message: RawMessage,
}

/// Events a channel can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    Message(InboundMessage),
    Typing {
        channel_id: String,
        user: Speaker,
        typing: bool,
    },
}

impl ChannelEvent {
    pub fn channel_id(&self) -> &str {
        match self {
            ChannelEvent::Message(inbound) => &inbound.channel_id,
            ChannelEvent::Typing { channel_id, .. } => channel_id,
        }
    }
}

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic, message
/// formatting, and authentication.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "openwebui").
    fn name(&self) -> &str;

    /// Start listening for inbound events.
    async fn start(
        &self,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<ChannelEvent, ChannelError>>, ChannelError>;

    /// Post a message into a platform channel.
    async fn send(&self, channel_id: &str, content: &str) -> Result<(), ChannelError>;

    /// Signal that the bot is typing. Fire-and-forget.
    async fn send_typing(&self, _channel_id: &str) -> Result<(), ChannelError> {
        Ok(()) // No-op default
    }

    /// Stop the channel gracefully.
    async fn stop(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Health check: is the channel connected and operational?
    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(true)
    }
}

/// Read access to the platform's message history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch up to `limit` messages, newest first, optionally strictly
    /// older than `before_id`.
    async fn fetch(
        &self,
        channel_id: &str,
        limit: usize,
        before_id: Option<&str>,
    ) -> Result<Vec<RawMessage>, ChannelError>;
}
