//! Playback controller.
//!
//! - [`controller`]: the player actor and its handle
//! - [`chase`]: seek coalescing
//! - [`observer`]: callbacks
//! - [`state`]: published snapshot

pub mod chase;
pub mod controller;
pub mod observer;
pub mod state;

pub use chase::{SeekChaser, SeekDecision, SeekOutcome};
pub use controller::{MediaPlayer, PlayerDriver};
pub use observer::PlayerObserver;
pub use state::PlayerSnapshot;
