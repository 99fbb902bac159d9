//! Media pipeline bridge.
//!
//! The playback controller in `core-playback` never decodes or renders media.
//! It drives an opaque pipeline supplied by the host (an AVPlayer wrapper, a
//! GStreamer playbin, a test double) through this trait, and reacts to the
//! pipeline's readiness through a watch channel.

use async_trait::async_trait;
use core_async::sync::watch;
use std::time::Duration;

/// Readiness of the media loaded into a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineStatus {
    /// The pipeline has not finished inspecting its source yet.
    #[default]
    Unknown,
    /// Playback can start; duration and seeking are available.
    ReadyToPlay,
    /// The source could not be played (malformed media, network failure).
    Failed { message: String },
}

impl PipelineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineStatus::ReadyToPlay)
    }
}

/// Opaque player driven by the playback controller.
///
/// Commands are fire-and-forget and must not block. `seek` and `duration` may
/// take arbitrarily long; the controller never awaits them on its own context.
#[async_trait]
pub trait MediaPipeline: Send + Sync {
    /// Subscribe to readiness changes.
    ///
    /// The receiver's current value is the pipeline's status at the time of
    /// the call.
    fn status(&self) -> watch::Receiver<PipelineStatus>;

    /// Start or resume rendering.
    fn play(&self);

    /// Pause rendering, keeping the playhead.
    fn pause(&self);

    /// Current output volume, `0.0..=1.0`.
    fn volume(&self) -> f32;

    /// Set output volume, `0.0..=1.0`.
    fn set_volume(&self, volume: f32);

    /// Current playhead position.
    fn current_time(&self) -> Duration;

    /// Total duration of the loaded asset, `None` when indefinite.
    async fn duration(&self) -> Option<Duration>;

    /// Seek to an exact position with zero tolerance.
    ///
    /// Resolves once the pipeline has settled; returns `false` if the seek was
    /// interrupted by the pipeline itself.
    async fn seek(&self, position: Duration) -> bool;
}
