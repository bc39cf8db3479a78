//! Token budget trimming.
//!
//! System turns are anchors and always survive. Dialogue turns are kept
//! newest-first until the next older one would overflow what the system
//! turns leave of the ceiling; the survivors keep their original order.

use toaster_core::message::Turn;

use crate::context::token::estimate_turn_tokens;

/// Trim `turns` to fit `ceiling` tokens.
///
/// If the system turns alone exceed the ceiling, every dialogue turn is
/// dropped and the system turns are returned as-is. Deterministic and
/// idempotent: `trim(&trim(t, c), c) == trim(t, c)`.
pub fn trim(turns: &[Turn], ceiling: usize) -> Vec<Turn> {
    let system_cost: usize = turns
        .iter()
        .filter(|t| t.is_system())
        .map(estimate_turn_tokens)
        .sum();
    let budget = ceiling.saturating_sub(system_cost);

    let mut keep: Vec<bool> = turns.iter().map(Turn::is_system).collect();
    let mut used = 0usize;

    for (idx, turn) in turns.iter().enumerate().rev() {
        if turn.is_system() {
            continue;
        }
        let cost = estimate_turn_tokens(turn);
        if used + cost > budget {
            break;
        }
        used += cost;
        keep[idx] = true;
    }

    turns
        .iter()
        .zip(keep)
        .filter_map(|(turn, kept)| kept.then(|| turn.clone()))
        .collect()
}
