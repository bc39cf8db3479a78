//! Per-channel conversation state.
//!
//! Process-lifetime only; on restart every channel is rebuilt lazily from
//! platform history. Owned by the bot loop, which handles one event at a
//! time, so there is no locking here.

use std::collections::HashMap;

use toaster_core::message::Turn;

/// Stored state for one channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    /// Last assembled window, chronological, without the preamble.
    pub turns: Vec<Turn>,
    /// Messages at or before this timestamp are excluded from new windows.
    pub horizon: Option<i64>,
    /// Newest platform timestamp observed in this channel.
    pub last_seen: Option<i64>,
}

#[derive(Debug, Default)]
pub struct ConversationStore {
    channels: HashMap<String, ChannelState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel_id: &str) -> Option<&ChannelState> {
        self.channels.get(channel_id)
    }

    /// The stored window, or an empty slice.
    pub fn turns(&self, channel_id: &str) -> &[Turn] {
        self.channels
            .get(channel_id)
            .map(|c| c.turns.as_slice())
            .unwrap_or(&[])
    }

    pub fn horizon(&self, channel_id: &str) -> Option<i64> {
        self.channels.get(channel_id).and_then(|c| c.horizon)
    }

    /// Record a message timestamp for the channel.
    pub fn observe(&mut self, channel_id: &str, created_at: i64) {
        let state = self.channels.entry(channel_id.to_string()).or_default();
        state.last_seen = Some(state.last_seen.map_or(created_at, |t| t.max(created_at)));
    }

    /// Replace the channel's window with a freshly assembled one.
    pub fn replace(&mut self, channel_id: &str, turns: Vec<Turn>) {
        self.channels.entry(channel_id.to_string()).or_default().turns = turns;
    }

    pub fn push(&mut self, channel_id: &str, turn: Turn) {
        self.channels
            .entry(channel_id.to_string())
            .or_default()
            .turns
            .push(turn);
    }

    /// Clear the channel's window and move its horizon up to the newest
    /// timestamp seen. Returns `false` when nothing was stored.
    pub fn clear(&mut self, channel_id: &str) -> bool {
        let Some(state) = self.channels.get_mut(channel_id) else {
            return false;
        };
        if state.turns.is_empty() {
            return false;
        }

        let newest_turn = state.turns.iter().filter_map(|t| t.created_at).max();
        let newest = [state.last_seen, newest_turn, state.horizon]
            .into_iter()
            .flatten()
            .max();
        state.turns.clear();
        state.horizon = newest;
        true
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
