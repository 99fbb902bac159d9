//! Observable player state.

use bridge_traits::PipelineStatus;
use std::time::Duration;

/// Read-only view of a player, published after every state change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub status: PipelineStatus,
    pub is_playing: bool,
    pub is_muted: bool,
    /// Fixed once resolved; `None` while unknown or indefinite.
    pub duration: Option<Duration>,
    /// Last sampled playhead position.
    pub progress: Duration,
    pub chase_target: Option<Duration>,
    pub seek_in_flight: bool,
}

impl PlayerSnapshot {
    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }
}
