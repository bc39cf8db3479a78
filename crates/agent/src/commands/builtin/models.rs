//! Model listing and switching.

use async_trait::async_trait;
use tracing::info;

use crate::commands::{CommandContext, CommandError, CommandHandler};

pub struct ModelList;

#[async_trait]
impl CommandHandler for ModelList {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        _args: &str,
    ) -> Result<String, CommandError> {
        let models = match ctx.services.invoker.list_models().await {
            Ok(models) => models,
            Err(e) => return Ok(format!("*Failed to get models: {e}*")),
        };
        if models.is_empty() {
            return Ok("*No models available*".into());
        }

        let mut text = String::from("Available models:\n\n");
        for model in &models {
            text.push_str(&format!("- {}", model.id));
            if model.id == ctx.settings.chat_model {
                text.push_str(" (current)");
            }
            if model.id == ctx.settings.decision_model {
                text.push_str(" (decision)");
            }
            text.push('\n');
        }
        Ok(format!("```\n{text}```"))
    }
}

/// Which slot(s) a switch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Decision,
    Conversation,
    Both,
}

impl Target {
    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-d" => Some(Target::Decision),
            "-c" => Some(Target::Conversation),
            "-a" => Some(Target::Both),
            _ => None,
        }
    }
}

/// `modelswitch -d|-c|-a <id>` or `modelswitch -a <decision>,<chat>`.
pub struct ModelSwitch;

#[async_trait]
impl CommandHandler for ModelSwitch {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        args: &str,
    ) -> Result<String, CommandError> {
        let sentinel = ctx.services.sentinel;
        let mut parts = args.split_whitespace();

        let Some(flag) = parts.next() else {
            return Ok(
                "*Provide a model type to switch -d (decision model) -c (conversation model).*"
                    .into(),
            );
        };
        let Some(target) = Target::from_flag(flag) else {
            return Ok(
                "*Invalid model type. Use -d (decision model), -c (conversation model), or -a (both).*"
                    .into(),
            );
        };
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() {
            return Ok(format!(
                "*Provide a model ID to switch to. Use {sentinel}modellist to see available models.*"
            ));
        }
        // A pair may be written with spaces around the comma.
        let ids = rest.join(" ");
        let usage = || format!("*Usage: {sentinel}modelswitch <-d|-c|-a> <model_id>[,<model_id>]*");

        let switch = match (target, ids.split_once(',')) {
            (Target::Both, Some((d, c))) => Switch::Pair(d.trim(), c.trim()),
            (_, Some(_)) => return Ok(usage()),
            (_, None) if rest.len() > 1 => return Ok(usage()),
            (Target::Both, None) => Switch::Pair(&ids, &ids),
            (Target::Decision, None) => Switch::Decision(&ids),
            (Target::Conversation, None) => Switch::Conversation(&ids),
        };
        if switch.ids().iter().any(|id| id.contains(char::is_whitespace)) {
            return Ok(usage());
        }

        let available = match ctx.services.invoker.list_models().await {
            Ok(models) => models,
            Err(e) => return Ok(format!("*Failed to switch model: {e}*")),
        };
        for id in switch.ids() {
            if id.is_empty() || !available.iter().any(|m| m.id == id) {
                return Ok(format!(
                    "*Model '{id}' not found. Use {sentinel}modellist to see available models.*"
                ));
            }
        }

        let reply = match switch {
            Switch::Decision(d) => {
                ctx.settings.decision_model = d.to_string();
                format!("*Switched decision model to: {d}*")
            }
            Switch::Conversation(c) => {
                ctx.settings.chat_model = c.to_string();
                format!("*Switched to model: {c}*")
            }
            Switch::Pair(d, c) => {
                ctx.settings.decision_model = d.to_string();
                ctx.settings.chat_model = c.to_string();
                if d == c {
                    format!("*Switched decision and conversation models to: {d}*")
                } else {
                    format!("*Switched decision model to: {d} and conversation model to: {c}*")
                }
            }
        };
        info!(
            decision_model = %ctx.settings.decision_model,
            chat_model = %ctx.settings.chat_model,
            "Models switched"
        );
        Ok(reply)
    }
}

/// A validated request naming the new model id(s).
enum Switch<'a> {
    Decision(&'a str),
    Conversation(&'a str),
    Pair(&'a str, &'a str),
}

impl<'a> Switch<'a> {
    fn ids(&self) -> Vec<&'a str> {
        match *self {
            Switch::Decision(id) | Switch::Conversation(id) => vec![id],
            Switch::Pair(d, c) => vec![d, c],
        }
    }
}
