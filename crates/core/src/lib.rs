//! # Toaster Core
//!
//! Domain types, collaborator traits, and error definitions for the Toaster
//! chat bot. This crate performs **no I/O**: it defines the model that the
//! platform adapter, the model backend, and the conversation engine all
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (model backend, chat platform, history store)
//! is a trait here. Implementations live in their respective crates. This
//! enables:
//! - Swapping the platform or backend via configuration
//! - Testing the conversation engine with scripted stand-ins
//! - A clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod gif;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelEvent, HistorySource, InboundMessage, RawMessage, RawReaction};
pub use error::{ChannelError, Error, ModelInvocationFailure, ProviderError, Result};
pub use gif::GifSearch;
pub use message::{ReactionRollup, Role, Speaker, Turn, TurnPayload};
pub use provider::{ModelInfo, Provider, ProviderRequest, ProviderResponse, Usage};
