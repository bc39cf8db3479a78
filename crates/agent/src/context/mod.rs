//! Conversation context pipeline.
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Assemble | [`assembler`] | chronological turns, no preamble |
//! | Store | [`store`] | per-channel window + clear horizon |
//! | Trim | [`trimmer`] | window fitted to the token ceiling |
//!
//! Token accounting for every stage lives in [`token`].

pub mod assembler;
pub mod store;
pub mod token;
pub mod trimmer;

pub use assembler::{AssemblyError, ContextAssembler, sanitize_name};
pub use store::{ChannelState, ConversationStore};
pub use token::{RoleBreakdown, TURN_OVERHEAD, estimate_tokens, estimate_turns_tokens};
pub use trimmer::trim;
