//! Open WebUI wire shapes.
//!
//! History responses and live `channel-events` payloads share the same
//! message object; both decode into [`RawMessage`].

use serde::Deserialize;
use toaster_core::channel::{ChannelEvent, InboundMessage, RawMessage, RawReaction};
use toaster_core::error::ChannelError;
use toaster_core::message::Speaker;

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl WireUser {
    fn into_speaker(self) -> Speaker {
        let name = self.name.unwrap_or_else(|| self.id.clone());
        Speaker::new(self.id, name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireReaction {
    pub name: String,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// A channel message as Open WebUI serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user: Option<WireUser>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub reactions: Option<Vec<WireReaction>>,
}

impl WireMessage {
    /// Convert to the platform-neutral form. `fallback` names the author
    /// when the message carries no embedded user object.
    pub fn into_raw(self, fallback: Option<&WireUser>) -> Result<RawMessage, ChannelError> {
        let author = match (self.user, self.user_id, fallback) {
            (Some(user), _, _) => user.into_speaker(),
            (None, Some(id), Some(f)) if f.id == id => f.clone().into_speaker(),
            (None, Some(id), _) => Speaker::new(id.clone(), id),
            (None, None, Some(f)) => f.clone().into_speaker(),
            (None, None, None) => {
                return Err(ChannelError::InvalidPayload(format!(
                    "message {} has no author",
                    self.id
                )));
            }
        };

        let reactions = self
            .reactions
            .unwrap_or_default()
            .into_iter()
            .map(|r| RawReaction {
                count: r.count.unwrap_or(r.user_ids.len() as u32),
                name: r.name,
                account_ids: r.user_ids,
            })
            .collect();

        Ok(RawMessage {
            id: self.id,
            author,
            text: self.content.unwrap_or_default(),
            created_at: self.created_at,
            reactions,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    channel_id: String,
    user: WireUser,
    data: WireData,
}

#[derive(Debug, Deserialize)]
struct WireData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireTyping {
    #[serde(default)]
    typing: bool,
}

/// Decode one `channel-events` payload.
///
/// Returns `Ok(None)` for event types the bot does not consume.
pub fn decode_event(payload: serde_json::Value) -> Result<Option<ChannelEvent>, ChannelError> {
    let envelope: WireEnvelope = serde_json::from_value(payload)
        .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;

    match envelope.data.kind.as_str() {
        "message" => {
            let message: WireMessage = serde_json::from_value(envelope.data.data)
                .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;
            let message = message.into_raw(Some(&envelope.user))?;
            Ok(Some(ChannelEvent::Message(InboundMessage {
                channel_id: envelope.channel_id,
                message,
            })))
        }
        "typing" => {
            let typing: WireTyping = serde_json::from_value(envelope.data.data)
                .map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;
            Ok(Some(ChannelEvent::Typing {
                channel_id: envelope.channel_id,
                user: envelope.user.into_speaker(),
                typing: typing.typing,
            }))
        }
        _ => Ok(None),
    }
}

/// Decode a history response body (a newest-first array of messages).
pub fn decode_history(body: serde_json::Value) -> Result<Vec<RawMessage>, ChannelError> {
    let messages: Vec<WireMessage> =
        serde_json::from_value(body).map_err(|e| ChannelError::InvalidPayload(e.to_string()))?;
    messages.into_iter().map(|m| m.into_raw(None)).collect()
}
