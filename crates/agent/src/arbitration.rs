//! Response arbitration.
//!
//! Before the bot speaks unprompted, a decision model is asked whether it
//! should. The whole conversation is interpolated as text into one
//! directive turn, so the decision is always a single request whatever the
//! history length. The answer is classified into a tri-state [`Verdict`].

use toaster_config::BehaviorConfig;
use toaster_core::error::ModelInvocationFailure;
use toaster_core::message::Turn;
use tracing::debug;

use crate::invoke::ModelInvoker;

/// Outcome of a decision query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Affirmative,
    Negative,
    /// Neither "yes" nor "no" was found. Carries the raw model text.
    Unparseable(String),
}

impl Verdict {
    /// Classify raw decision text.
    ///
    /// Case-insensitive substring match: `yes` wins, then `no`, else the
    /// trimmed raw text is kept.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("yes") {
            Verdict::Affirmative
        } else if lowered.contains("no") {
            Verdict::Negative
        } else {
            Verdict::Unparseable(raw.trim().to_string())
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Affirmative => "affirmative",
            Verdict::Negative => "negative",
            Verdict::Unparseable(_) => "unparseable",
        }
    }
}

/// Builds decision queries and classifies their answers.
#[derive(Debug, Clone)]
pub struct Arbiter {
    bot_name: String,
    aliases: Vec<String>,
}

impl Arbiter {
    pub fn new(bot_name: impl Into<String>, aliases: Vec<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            aliases,
        }
    }

    pub fn from_config(behavior: &BehaviorConfig) -> Self {
        Self::new(behavior.bot_name.clone(), behavior.aliases.clone())
    }

    /// The single directive turn sent to the decision model.
    ///
    /// System turns in `conversation` (the persona preamble) are not part
    /// of the transcript.
    pub fn directive(&self, conversation: &[Turn]) -> Turn {
        let names = std::iter::once(self.bot_name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .map(|n| format!("\"{n}\""))
            .collect::<Vec<_>>()
            .join(", ");

        let transcript = conversation
            .iter()
            .filter(|t| !t.is_system())
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n");

        Turn::system(format!(
            "VERY IMPORTANT: ANSWER ONLY WITH \"yes\" OR \"no\". DO NOT INCLUDE ANY OTHER TEXT.\n\
             \n\
             You are {bot}, an active member of the group chat below. Decide whether you \
             should reply to the latest messages.\n\
             \n\
             Answer \"yes\" if any of these hold:\n\
             - you are named or referred to ({names}), including by pronoun\n\
             - someone asks the group a question\n\
             - someone asks for help, mentions commands, or talks about technology\n\
             - a message contains a bare question mark\n\
             \n\
             Answer \"no\" only if the latest message is clearly addressed to someone else, \
             is an automated platform notice, or is people talking among themselves without \
             a question.\n\
             \n\
             When unsure, answer \"yes\".\n\
             \n\
             Chat transcript (oldest first):\n\
             {transcript}\n\
             \n\
             Should {bot} reply? Answer \"yes\" or \"no\".",
            bot = self.bot_name,
        ))
    }

    /// Ask `model` whether the bot should speak in `channel_id`.
    ///
    /// A failed model call is returned as such; the caller decides what
    /// silence means.
    pub async fn decide(
        &self,
        invoker: &ModelInvoker,
        model: &str,
        channel_id: &str,
        conversation: &[Turn],
    ) -> Result<Verdict, ModelInvocationFailure> {
        let directive = self.directive(conversation);
        let raw = invoker.complete(model, vec![directive]).await?;
        let verdict = Verdict::parse(&raw);
        debug!(channel_id, model, verdict = verdict.label(), "Arbitration verdict");
        Ok(verdict)
    }
}
