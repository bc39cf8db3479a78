//! Token counting.
//!
//! Counts use the `o200k_base` BPE encoding (the gpt-4o tokenizer) via
//! `tiktoken-rs`. Every turn additionally costs a fixed formatting overhead
//! for role markers and delimiters.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;
use toaster_core::message::{Role, Turn};
use tracing::warn;

/// Per-turn overhead for role name, delimiters and formatting markers.
pub const TURN_OVERHEAD: usize = 4;

/// The shared encoder, built on first use. `None` if the embedded ranks
/// failed to load.
fn encoder() -> Option<&'static CoreBPE> {
    static BPE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    BPE.get_or_init(|| match tiktoken_rs::o200k_base() {
        Ok(bpe) => Some(bpe),
        Err(e) => {
            warn!(error = %e, "o200k_base encoder unavailable, counting ~4 bytes per token");
            None
        }
    })
    .as_ref()
}

/// Count the tokens in a string.
///
/// Special-token markup in chat text is counted as ordinary text.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    match encoder() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => text.len().div_ceil(4),
    }
}

/// Estimate tokens for a single turn including the per-turn overhead.
pub fn estimate_turn_tokens(turn: &Turn) -> usize {
    TURN_OVERHEAD + estimate_tokens(&turn.content)
}

/// Estimate tokens for a slice of turns.
pub fn estimate_turns_tokens(turns: &[Turn]) -> usize {
    turns.iter().map(estimate_turn_tokens).sum()
}

/// Token totals for a window, split by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleBreakdown {
    pub system: usize,
    pub user: usize,
    pub assistant: usize,
}

impl RoleBreakdown {
    pub fn of(turns: &[Turn]) -> Self {
        let mut breakdown = Self::default();
        for turn in turns {
            let cost = estimate_turn_tokens(turn);
            match turn.role {
                Role::System => breakdown.system += cost,
                Role::User => breakdown.user += cost,
                Role::Assistant => breakdown.assistant += cost,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.system + self.user + self.assistant
    }

    /// Non-zero roles in display order.
    pub fn entries(&self) -> impl Iterator<Item = (Role, usize)> {
        [
            (Role::System, self.system),
            (Role::User, self.user),
            (Role::Assistant, self.assistant),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
    }
}
