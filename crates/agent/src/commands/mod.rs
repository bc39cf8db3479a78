//! Sentinel-prefixed chat commands.
//!
//! - [`registry`]: name → (description, handler factory), unique names,
//!   registration order preserved
//! - [`dispatch`]: parse `$name args`, run the handler, turn every failure
//!   into a reply string
//! - [`builtin`]: the commands the bot ships with

pub mod builtin;
pub mod dispatch;
pub mod registry;
pub mod settings;

pub use dispatch::{Dispatcher, INVALID_COMMAND, Invocation, parse_invocation};
pub use registry::{CommandEntry, CommandRegistry, HandlerFactory, RegistryError};
pub use settings::BotSettings;

use async_trait::async_trait;
use toaster_core::error::{ChannelError, ModelInvocationFailure};

use crate::context::ConversationStore;
use crate::services::BotServices;

/// Failure inside a command handler. Never leaves the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Model(#[from] ModelInvocationFailure),

    #[error("{0}")]
    Channel(#[from] ChannelError),

    #[error("{0}")]
    Failed(String),
}

/// Everything a handler may touch during one dispatch.
pub struct CommandContext<'a> {
    pub channel_id: &'a str,
    /// Staged copy; committed only if the handler returns `Ok`.
    pub settings: &'a mut BotSettings,
    pub conversations: &'a mut ConversationStore,
    pub services: &'a BotServices,
    /// Registered commands, in registration order.
    pub catalog: &'a [CommandEntry],
}

/// A single command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run with the text after the command name (already trimmed).
    async fn execute(&self, ctx: &mut CommandContext<'_>, args: &str)
    -> Result<String, CommandError>;
}
