//! Conversation context assembly.
//!
//! Turns a newest-first batch of platform messages (plus the live inbound
//! message) into a chronological window of role-tagged turns:
//!
//! 1. **Order**: the batch is reversed; the inbound message is appended
//!    unless the batch already holds it
//! 2. **Identity**: account ids from authors *and* reactions resolve to
//!    display names
//! 3. **Command pairing**: command messages are dropped, along with the
//!    bot message that directly follows each one
//! 4. **Horizon**: messages at or before a cleared-context horizon are
//!    left out of the window
//! 5. **Payload**: each surviving message becomes a [`TurnPayload`] (or
//!    plain text) with sanitized names
//!
//! The output never contains the system preamble; callers prepend it.
//!
//! # Determinism
//!
//! Assembly is a pure function of its inputs.

use std::collections::HashMap;

use toaster_config::{BotConfig, ContentFormat};
use toaster_core::channel::RawMessage;
use toaster_core::message::{ReactionRollup, Role, Speaker, Turn, TurnPayload};

// ── Errors ────────────────────────────────────────────────────────────────

/// Errors from context assembly.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("failed to serialize turn payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ── Names ─────────────────────────────────────────────────────────────────

/// Replace every character outside `[alnum - _]` with `_`, one for one.
///
/// Model-facing name fields only accept that character set.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The context assembler. Stateless: create one and reuse it.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    bot_user_id: String,
    sentinel: char,
    format: ContentFormat,
}

impl ContextAssembler {
    pub fn new(bot_user_id: impl Into<String>, sentinel: char, format: ContentFormat) -> Self {
        Self {
            bot_user_id: bot_user_id.into(),
            sentinel,
            format,
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(
            config.platform.bot_user_id.clone().unwrap_or_default(),
            config.behavior.sentinel,
            config.behavior.content_format,
        )
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    pub fn format(&self) -> ContentFormat {
        self.format
    }

    /// Whether `text` is a command invocation.
    pub fn is_command(&self, text: &str) -> bool {
        text.starts_with(self.sentinel)
    }

    fn role_of(&self, author_id: &str) -> Role {
        if author_id == self.bot_user_id {
            Role::Assistant
        } else {
            Role::User
        }
    }

    /// Assemble the window for one channel.
    ///
    /// `history` is newest-first as the platform returns it. `inbound` is
    /// the message that triggered this pass; it is de-duplicated by id.
    /// Messages with `created_at <= horizon` still take part in command
    /// pairing but are not emitted.
    pub fn assemble(
        &self,
        history: &[RawMessage],
        inbound: Option<&RawMessage>,
        horizon: Option<i64>,
    ) -> Result<Vec<Turn>, AssemblyError> {
        let mut chronological: Vec<&RawMessage> = history.iter().rev().collect();
        if let Some(msg) = inbound {
            if !history.iter().any(|h| h.id == msg.id) {
                chronological.push(msg);
            }
        }

        let names = Self::identity_lookup(&chronological);

        let mut turns = Vec::with_capacity(chronological.len());
        let mut pending_skip = false;

        for msg in chronological {
            if msg.text.trim().is_empty() {
                continue;
            }
            if self.is_command(&msg.text) {
                pending_skip = true;
                continue;
            }
            if std::mem::take(&mut pending_skip) && msg.author.id == self.bot_user_id {
                continue;
            }
            if horizon.is_some_and(|h| msg.created_at <= h) {
                continue;
            }
            turns.push(self.render(msg, &names)?);
        }

        Ok(turns)
    }

    /// Build a turn for a message the bot just posted, in the same shape as
    /// assembled turns.
    pub fn bot_turn(
        &self,
        bot_name: &str,
        text: &str,
        created_at: Option<i64>,
    ) -> Result<Turn, AssemblyError> {
        let speaker = Speaker::new(self.bot_user_id.clone(), sanitize_name(bot_name));
        let content = match self.format {
            ContentFormat::Structured => TurnPayload {
                user: speaker.clone(),
                message: text.to_string(),
                reactions: Vec::new(),
            }
            .to_canonical()?,
            ContentFormat::Plain => text.to_string(),
        };
        Ok(Turn {
            role: Role::Assistant,
            speaker: Some(speaker),
            content,
            created_at,
        })
    }

    /// `account id → display name`, seeded from reactors so accounts that
    /// only reacted still resolve; authors override the seed.
    fn identity_lookup(messages: &[&RawMessage]) -> HashMap<String, String> {
        let mut names: HashMap<String, String> = HashMap::new();
        for msg in messages {
            for reaction in &msg.reactions {
                for id in &reaction.account_ids {
                    names.entry(id.clone()).or_insert_with(|| id.clone());
                }
            }
        }
        for msg in messages {
            names.insert(msg.author.id.clone(), msg.author.name.clone());
        }
        names
    }

    fn render(&self, msg: &RawMessage, names: &HashMap<String, String>) -> Result<Turn, AssemblyError> {
        let speaker = Speaker::new(msg.author.id.clone(), sanitize_name(&msg.author.name));

        let content = match self.format {
            ContentFormat::Structured => {
                let reactions = msg
                    .reactions
                    .iter()
                    .map(|r| ReactionRollup {
                        name: r.name.clone(),
                        count: r.count,
                        users: r
                            .account_ids
                            .iter()
                            .map(|id| sanitize_name(names.get(id).unwrap_or(id)))
                            .collect(),
                    })
                    .collect();
                TurnPayload {
                    user: speaker.clone(),
                    message: msg.text.clone(),
                    reactions,
                }
                .to_canonical()?
            }
            ContentFormat::Plain => msg.text.clone(),
        };

        Ok(Turn {
            role: self.role_of(&msg.author.id),
            speaker: Some(speaker),
            content,
            created_at: Some(msg.created_at),
        })
    }
}
