//! Turn and payload domain types.
//!
//! These are the value objects that flow through the conversation engine:
//! platform history → assembled turns → trimmed window → model request.

use serde::{Deserialize, Serialize};

/// The role of a turn in the model-facing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona / instruction text. Never trimmed.
    System,
    /// Anyone in the channel who is not the bot
    User,
    /// The bot itself
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a platform account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub name: String,
}

impl Speaker {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One role-tagged unit of conversation content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,

    /// Originating account. `None` for system turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<Speaker>,

    /// Raw text, or the canonical serialization of a [`TurnPayload`].
    pub content: String,

    /// Platform timestamp of the source message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Turn {
    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            speaker: None,
            content: content.into(),
            created_at: None,
        }
    }

    /// Create a user turn without speaker metadata.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            speaker: None,
            content: content.into(),
            created_at: None,
        }
    }

    /// Create an assistant turn without speaker metadata.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            speaker: None,
            content: content.into(),
            created_at: None,
        }
    }

    pub fn with_speaker(mut self, speaker: Speaker) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn at(mut self, created_at: i64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// A reaction summary attached to a structured turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRollup {
    /// Reaction (emoji) name, e.g. `melting_face`
    pub name: String,
    pub count: u32,
    /// Resolved display names of the reacting accounts
    pub users: Vec<String>,
}

/// The structured shape every turn in a window shares:
/// `{user:{id,name}, message, reactions:[{name,count,users}]}`.
///
/// Field order is fixed by the struct definition, so serialization is
/// canonical for a given value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPayload {
    pub user: Speaker,
    pub message: String,
    #[serde(default)]
    pub reactions: Vec<ReactionRollup>,
}

impl TurnPayload {
    /// Serialize to the canonical single-line JSON form.
    pub fn to_canonical(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
