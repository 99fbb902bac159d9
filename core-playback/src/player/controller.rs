//! # Media Player
//!
//! Drives an opaque [`MediaPipeline`]: readiness and failure tracking,
//! play/pause/stop/mute, progress sampling and seek chasing.
//!
//! ## Architecture
//!
//! [`MediaPlayer`] is a cloneable handle; [`PlayerDriver`] owns the state and
//! serializes four inputs:
//!
//! - commands from handles
//! - pipeline status changes (watch channel)
//! - results of off-context work (duration probing, real seeks)
//! - sampler ticks, present only while playing
//!
//! Control operations report `false` instead of failing when the player is
//! not ready or already in the requested condition.

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::player::chase::{SeekChaser, SeekDecision, SeekOutcome};
use crate::player::observer::PlayerObserver;
use crate::player::state::PlayerSnapshot;
use bridge_traits::{MediaPipeline, PipelineStatus};
use core_async::sync::{mpsc, oneshot, watch};
use core_async::time::{fresh_interval, Interval};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn};

type Reply = oneshot::Sender<bool>;

enum Command {
    Play(Reply),
    Pause(Reply),
    Stop(Reply),
    Mute(Reply),
    Unmute(Reply),
    Seek { position: Duration, reply: Reply },
    SetAutoPlay(bool),
    SetObserver(Option<Weak<dyn PlayerObserver>>),
}

enum Internal {
    DurationResolved(Option<Duration>),
    SeekFinished {
        target: Duration,
        generation: u64,
        reached: bool,
    },
}

enum Step {
    Command(Option<Command>),
    Internal(Option<Internal>),
    Status(Option<PipelineStatus>),
    Tick,
}

// ============================================================================
// MediaPlayer (handle)
// ============================================================================

/// Cloneable handle to a player.
#[derive(Clone)]
pub struct MediaPlayer {
    id: String,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<PlayerSnapshot>,
}

impl MediaPlayer {
    /// Create a player for `pipeline` and its driver.
    pub fn new(
        pipeline: Arc<dyn MediaPipeline>,
        config: PlayerConfig,
        event_bus: Option<EventBus>,
    ) -> Result<(Self, PlayerDriver)> {
        config.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlayerSnapshot::default());
        let status = pipeline.status();

        let driver = PlayerDriver {
            id: id.clone(),
            auto_play: config.auto_play,
            config,
            pipeline,
            commands: command_rx,
            internal_tx,
            internal_rx,
            status_rx: Some(status),
            status: PipelineStatus::Unknown,
            is_playing: false,
            is_muted: false,
            saved_volume: 1.0,
            duration: None,
            duration_requested: false,
            progress: Duration::ZERO,
            chaser: SeekChaser::new(),
            sampler: None,
            observer: None,
            event_bus,
            snapshot: snapshot_tx,
        };

        let player = Self {
            id,
            commands: command_tx,
            snapshot: snapshot_rx,
        };

        Ok((player, driver))
    }

    /// Create a player and run its driver on the async runtime.
    pub fn spawn(
        pipeline: Arc<dyn MediaPipeline>,
        config: PlayerConfig,
        event_bus: Option<EventBus>,
    ) -> Result<Self> {
        let (player, driver) = Self::new(pipeline, config, event_bus)?;
        core_async::spawn(driver.run());
        Ok(player)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Start playback. `false` if not ready or already playing.
    pub async fn play(&self) -> bool {
        self.request(Command::Play).await
    }

    /// Pause playback. `false` if not ready or not playing.
    pub async fn pause(&self) -> bool {
        self.request(Command::Pause).await
    }

    /// Stop playback and rewind to the start. `false` if not ready.
    pub async fn stop(&self) -> bool {
        self.request(Command::Stop).await
    }

    /// Silence output, remembering the volume. `false` if not ready or muted.
    pub async fn mute(&self) -> bool {
        self.request(Command::Mute).await
    }

    /// Restore the volume saved by `mute`. `false` if not ready or not muted.
    pub async fn unmute(&self) -> bool {
        self.request(Command::Unmute).await
    }

    /// Seek to `position`.
    ///
    /// Resolves `true` once the pipeline has converged on the latest target
    /// for the caller that started a burst; callers that only moved the
    /// target or repeated it resolve immediately. `false` if not ready, or if
    /// the burst was abandoned by `stop` or a failure.
    pub async fn seek(&self, position: Duration) -> bool {
        self.request(|reply| Command::Seek { position, reply }).await
    }

    /// Arm or disarm the one-shot auto play flag.
    pub fn set_auto_play(&self, auto_play: bool) {
        let _ = self.commands.send(Command::SetAutoPlay(auto_play));
    }

    /// Attach an observer. Only a weak reference is kept.
    pub fn set_observer<O>(&self, observer: &Arc<O>)
    where
        O: PlayerObserver + 'static,
    {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn PlayerObserver> = weak;
        let _ = self.commands.send(Command::SetObserver(Some(weak)));
    }

    pub fn clear_observer(&self) {
        let _ = self.commands.send(Command::SetObserver(None));
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    async fn request<F>(&self, command: F) -> bool
    where
        F: FnOnce(Reply) -> Command,
    {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(command(tx)).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }
}

impl fmt::Debug for MediaPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPlayer")
            .field("id", &self.id)
            .field("snapshot", &*self.snapshot.borrow())
            .finish()
    }
}

// ============================================================================
// PlayerDriver
// ============================================================================

/// Owns the player state. Runs until every handle is dropped.
pub struct PlayerDriver {
    id: String,
    config: PlayerConfig,
    pipeline: Arc<dyn MediaPipeline>,
    commands: mpsc::UnboundedReceiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    status_rx: Option<watch::Receiver<PipelineStatus>>,
    status: PipelineStatus,
    is_playing: bool,
    is_muted: bool,
    saved_volume: f32,
    duration: Option<Duration>,
    duration_requested: bool,
    progress: Duration,
    auto_play: bool,
    chaser: SeekChaser<Reply>,
    sampler: Option<Interval>,
    observer: Option<Weak<dyn PlayerObserver>>,
    event_bus: Option<EventBus>,
    snapshot: watch::Sender<PlayerSnapshot>,
}

impl PlayerDriver {
    #[instrument(name = "media_player", skip(self), fields(player = %self.id))]
    pub async fn run(mut self) {
        debug!("Player driver started");

        // The pipeline may already be ready or failed when the driver starts.
        // Route the current status through the loop so queued commands (an
        // observer attached right after spawn) are handled before it.
        if let Some(rx) = self.status_rx.as_mut() {
            rx.mark_changed();
        }
        self.publish();

        loop {
            let step = core_async::select! {
                biased;
                command = self.commands.recv() => Step::Command(command),
                internal = self.internal_rx.recv() => Step::Internal(internal),
                status = status_changed(&mut self.status_rx) => Step::Status(status),
                _ = next_tick(&mut self.sampler) => Step::Tick,
            };

            match step {
                Step::Command(Some(command)) => self.handle_command(command),
                Step::Command(None) => break,
                Step::Internal(Some(internal)) => self.handle_internal(internal),
                Step::Internal(None) => {}
                Step::Status(Some(status)) => self.on_status(status),
                Step::Status(None) => {
                    debug!("Pipeline status channel closed");
                    self.status_rx = None;
                }
                Step::Tick => self.update_progress(),
            }

            self.publish();
        }

        self.sampler = None;
        if let Some(reply) = self.chaser.reset() {
            let _ = reply.send(false);
        }
        debug!("Player driver stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play(reply) => {
                let _ = reply.send(self.play());
            }
            Command::Pause(reply) => {
                let _ = reply.send(self.pause());
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.stop());
            }
            Command::Mute(reply) => {
                let _ = reply.send(self.mute());
            }
            Command::Unmute(reply) => {
                let _ = reply.send(self.unmute());
            }
            Command::Seek { position, reply } => self.seek(position, reply),
            Command::SetAutoPlay(auto_play) => self.auto_play = auto_play,
            Command::SetObserver(observer) => self.observer = observer,
        }
    }

    fn handle_internal(&mut self, internal: Internal) {
        match internal {
            Internal::DurationResolved(duration) => self.on_duration(duration),
            Internal::SeekFinished {
                target,
                generation,
                reached,
            } => self.on_seek_finished(target, generation, reached),
        }
    }

    // ------------------------------------------------------------------------
    // Pipeline status
    // ------------------------------------------------------------------------

    fn on_status(&mut self, status: PipelineStatus) {
        if status == self.status {
            return;
        }

        match &status {
            PipelineStatus::ReadyToPlay => {
                info!("Pipeline ready");
                self.status = status;
                if !self.duration_requested {
                    self.duration_requested = true;
                    self.resolve_duration();
                }
            }
            PipelineStatus::Failed { message } => {
                warn!(error = %message, "Pipeline failed");
                let message = message.clone();
                self.status = status;
                self.is_playing = false;
                self.sampler = None;
                if let Some(reply) = self.chaser.reset() {
                    let _ = reply.send(false);
                }
                if let Some(observer) = self.observer() {
                    observer.did_fail(&self.id, &message);
                }
                self.emit(PlaybackEvent::Failed {
                    player_id: self.id.clone(),
                    message,
                });
            }
            PipelineStatus::Unknown => {
                self.status = status;
            }
        }
    }

    /// Probe the duration off the driver and report back.
    fn resolve_duration(&self) {
        let pipeline = Arc::clone(&self.pipeline);
        let results = self.internal_tx.clone();
        core_async::spawn(async move {
            let duration = pipeline.duration().await;
            let _ = results.send(Internal::DurationResolved(duration));
        });
    }

    fn on_duration(&mut self, duration: Option<Duration>) {
        if !self.status.is_ready() {
            return;
        }

        self.duration = duration;
        debug!(duration = ?duration, "Duration resolved");

        if let Some(observer) = self.observer() {
            observer.ready_to_play(&self.id, duration);
        }
        self.emit(PlaybackEvent::ReadyToPlay {
            player_id: self.id.clone(),
            duration_ms: duration.map(as_millis),
        });

        if std::mem::take(&mut self.auto_play) {
            debug!("Auto play");
            self.play();
        }
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    fn play(&mut self) -> bool {
        if !self.status.is_ready() || self.is_playing {
            return false;
        }
        self.is_playing = true;
        self.pipeline.play();
        self.sampler = Some(fresh_interval(self.config.progress_interval));
        true
    }

    fn pause(&mut self) -> bool {
        if !self.status.is_ready() || !self.is_playing {
            return false;
        }
        self.is_playing = false;
        self.sampler = None;
        self.pipeline.pause();
        true
    }

    fn stop(&mut self) -> bool {
        if !self.status.is_ready() {
            return false;
        }

        self.is_playing = false;
        self.sampler = None;
        self.pipeline.pause();

        // Rewind without tracking; a pending chase is abandoned
        let pipeline = Arc::clone(&self.pipeline);
        core_async::spawn(async move {
            pipeline.seek(Duration::ZERO).await;
        });
        if let Some(reply) = self.chaser.reset() {
            let _ = reply.send(false);
        }

        self.set_progress(Duration::ZERO);
        true
    }

    fn mute(&mut self) -> bool {
        if !self.status.is_ready() || self.is_muted {
            return false;
        }
        self.saved_volume = self.pipeline.volume();
        self.pipeline.set_volume(0.0);
        self.is_muted = true;
        true
    }

    fn unmute(&mut self) -> bool {
        if !self.status.is_ready() || !self.is_muted {
            return false;
        }
        self.pipeline.set_volume(self.saved_volume);
        self.is_muted = false;
        true
    }

    // ------------------------------------------------------------------------
    // Seeking
    // ------------------------------------------------------------------------

    fn seek(&mut self, position: Duration, reply: Reply) {
        if !self.status.is_ready() {
            let _ = reply.send(false);
            return;
        }

        match self.chaser.request(position, self.is_playing, reply) {
            SeekDecision::Unchanged(reply) => {
                trace!(position = ?position, "Seek target unchanged");
                let _ = reply.send(true);
            }
            SeekDecision::Retargeted(reply) => {
                trace!(position = ?position, "Seek target moved");
                let _ = reply.send(true);
            }
            SeekDecision::Start { target, generation } => {
                self.pause();
                self.issue_seek(target, generation);
            }
        }
    }

    fn issue_seek(&self, target: Duration, generation: u64) {
        trace!(target = ?target, "Issuing seek");
        let pipeline = Arc::clone(&self.pipeline);
        let results = self.internal_tx.clone();
        core_async::spawn(async move {
            let reached = pipeline.seek(target).await;
            let _ = results.send(Internal::SeekFinished {
                target,
                generation,
                reached,
            });
        });
    }

    fn on_seek_finished(&mut self, target: Duration, generation: u64, reached: bool) {
        if !reached {
            debug!(target = ?target, "Pipeline interrupted seek");
        }

        match self.chaser.on_seek_finished(target, generation) {
            SeekOutcome::Stale => trace!(target = ?target, "Ignoring stale seek"),
            SeekOutcome::Reissue { target, generation } => self.issue_seek(target, generation),
            SeekOutcome::Settled {
                target,
                resume,
                completion,
            } => {
                debug!(target = ?target, resume, "Seek settled");
                if resume {
                    self.play();
                }
                if let Some(reply) = completion {
                    let _ = reply.send(true);
                }
                self.emit(PlaybackEvent::SeekCompleted {
                    player_id: self.id.clone(),
                    position_ms: as_millis(target),
                });
            }
        }
    }

    // ------------------------------------------------------------------------
    // Progress
    // ------------------------------------------------------------------------

    fn update_progress(&mut self) {
        if !self.is_playing {
            return;
        }

        let position = self.pipeline.current_time();
        self.set_progress(position);

        if let Some(duration) = self.duration {
            if position >= duration {
                info!("Playback finished");
                self.stop();
                if let Some(observer) = self.observer() {
                    observer.did_finish_play(&self.id);
                }
                self.emit(PlaybackEvent::Finished {
                    player_id: self.id.clone(),
                });
            }
        }
    }

    fn set_progress(&mut self, progress: Duration) {
        self.progress = progress;
        if let Some(observer) = self.observer() {
            observer.did_change_progress(&self.id, progress);
        }
        self.emit(PlaybackEvent::ProgressChanged {
            player_id: self.id.clone(),
            position_ms: as_millis(progress),
            duration_ms: self.duration.map(as_millis),
        });
    }

    // ------------------------------------------------------------------------
    // Notification plumbing
    // ------------------------------------------------------------------------

    fn observer(&self) -> Option<Arc<dyn PlayerObserver>> {
        self.observer.as_ref().and_then(Weak::upgrade)
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(PlayerSnapshot {
            status: self.status.clone(),
            is_playing: self.is_playing,
            is_muted: self.is_muted,
            duration: self.duration,
            progress: self.progress,
            chase_target: self.chaser.target(),
            seek_in_flight: self.chaser.in_flight(),
        });
    }
}

async fn status_changed(
    status_rx: &mut Option<watch::Receiver<PipelineStatus>>,
) -> Option<PipelineStatus> {
    match status_rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn next_tick(sampler: &mut Option<Interval>) {
    match sampler {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn as_millis(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
