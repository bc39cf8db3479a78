//! The conversation engine behind Toaster.
//!
//! For every inbound channel message the bot:
//!
//! 1. **Dispatches** it as a command if it starts with the sentinel
//! 2. **Assembles** the channel window from platform history (command
//!    pairs dropped, identities and reactions resolved)
//! 3. **Trims** the window to the token ceiling, newest turns first
//! 4. **Arbitrates** with the decision model: yes, no, or unparseable
//! 5. **Replies** with the chat model when the verdict is yes
//!
//! Every model call goes through [`ModelInvoker`], which bounds it with a
//! timeout and folds all failures into a single error type.

pub mod arbitration;
pub mod bot;
pub mod commands;
pub mod context;
pub mod invoke;
pub mod persona;
pub mod services;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use arbitration::{Arbiter, Verdict};
pub use bot::{Outcome, ToasterBot};
pub use commands::{
    BotSettings, CommandContext, CommandError, CommandHandler, CommandRegistry, Dispatcher,
};
pub use context::{AssemblyError, ContextAssembler, ConversationStore, trim};
pub use invoke::ModelInvoker;
pub use persona::Persona;
pub use services::BotServices;
