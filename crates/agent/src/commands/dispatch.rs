//! Command dispatch.
//!
//! The caller decides a message is a command (sentinel prefix) and hands it
//! here. Whatever happens inside a handler, the caller gets a reply string
//! back: unknown names, handler errors and handler panics included.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::commands::registry::CommandRegistry;
use crate::commands::{BotSettings, CommandContext};
use crate::context::ConversationStore;
use crate::services::BotServices;

/// Reply for unparseable or unknown commands.
pub const INVALID_COMMAND: &str = "*Not a valid command*";

/// A parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Lower-cased command name.
    pub name: String,
    /// Text after the name, trimmed.
    pub args: &'a str,
}

/// Split `$name rest` into name and arguments.
///
/// Returns `None` when the sentinel is missing or the name is empty.
pub fn parse_invocation(raw: &str, sentinel: char) -> Option<Invocation<'_>> {
    let body = raw.strip_prefix(sentinel)?.trim();
    let (name, args) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some(Invocation {
        name: name.to_lowercase(),
        args,
    })
}

pub struct Dispatcher {
    registry: CommandRegistry,
    sentinel: char,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, sentinel: char) -> Self {
        Self { registry, sentinel }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run the command in `raw` and return the reply text.
    ///
    /// Settings changes are staged and committed only when the handler
    /// returns `Ok`.
    pub async fn dispatch(
        &self,
        raw: &str,
        channel_id: &str,
        settings: &mut BotSettings,
        conversations: &mut ConversationStore,
        services: &BotServices,
    ) -> String {
        let Some(invocation) = parse_invocation(raw, self.sentinel) else {
            return INVALID_COMMAND.to_string();
        };
        let Some(entry) = self.registry.get(&invocation.name) else {
            debug!(command = %invocation.name, "Unknown command");
            return INVALID_COMMAND.to_string();
        };

        let handler = (entry.factory)();
        let mut staged = settings.clone();
        let mut ctx = CommandContext {
            channel_id,
            settings: &mut staged,
            conversations,
            services,
            catalog: self.registry.entries(),
        };

        debug!(command = %invocation.name, channel_id, "Dispatching command");
        let outcome = AssertUnwindSafe(handler.execute(&mut ctx, invocation.args))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(reply)) => {
                *settings = staged;
                reply
            }
            Ok(Err(e)) => {
                warn!(command = %invocation.name, error = %e, "Command failed");
                format!("*Command failed: {e}*")
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                warn!(command = %invocation.name, reason = %reason, "Command panicked");
                format!("*Command failed: {reason}*")
            }
        }
    }
}
