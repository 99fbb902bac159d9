//! Player callbacks.

use std::time::Duration;

/// Receives player notifications on the player's driver context.
///
/// The player holds its observer weakly: dropping the last `Arc` detaches it.
/// Every method has an empty default so an observer implements only what it
/// needs.
pub trait PlayerObserver: Send + Sync {
    /// The pipeline is ready and the duration has been resolved.
    fn ready_to_play(&self, _player_id: &str, _duration: Option<Duration>) {}

    /// A progress sample was taken, or progress was reset by `stop`.
    fn did_change_progress(&self, _player_id: &str, _progress: Duration) {}

    /// Progress reached the duration; playback has been stopped.
    fn did_finish_play(&self, _player_id: &str) {}

    /// The pipeline reported a failure.
    fn did_fail(&self, _player_id: &str, _message: &str) {}
}
