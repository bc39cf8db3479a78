//! Chat platform plumbing for Toaster.
//!
//! - **openwebui**: history fetch, message post and typing signal against an
//!   Open WebUI server, plus the inbound event stream
//! - **events**: Open WebUI `channel-events` wire shapes and their decoding
//! - **relay**: small HTTP endpoint that accepts forwarded `channel-events`
//!   and feeds them into the channel's event stream

pub mod events;
pub mod openwebui;
pub mod relay;

pub use events::decode_event;
pub use openwebui::OpenWebUiChannel;
pub use relay::{RelayState, build_router, verify_signature};
