//! Tests for the media player
//!
//! These tests drive the player against a scriptable pipeline and record
//! observer callbacks.

mod common;

use bridge_traits::{MediaPipeline, PipelineStatus};
use common::{eventually, FakePipeline};
use core_playback::{MediaPlayer, PlayerConfig, PlayerObserver};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
enum Note {
    Ready(Option<Duration>),
    Progress(Duration),
    Finished,
    Failed(String),
}

struct Recorder {
    tx: mpsc::UnboundedSender<Note>,
}

impl PlayerObserver for Recorder {
    fn ready_to_play(&self, _player_id: &str, duration: Option<Duration>) {
        let _ = self.tx.send(Note::Ready(duration));
    }

    fn did_change_progress(&self, _player_id: &str, progress: Duration) {
        let _ = self.tx.send(Note::Progress(progress));
    }

    fn did_finish_play(&self, _player_id: &str) {
        let _ = self.tx.send(Note::Finished);
    }

    fn did_fail(&self, _player_id: &str, message: &str) {
        let _ = self.tx.send(Note::Failed(message.to_string()));
    }
}

fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Note>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder { tx }), rx)
}

/// Wait for the first note matching `predicate`, skipping others.
async fn wait_for<F>(rx: &mut mpsc::UnboundedReceiver<Note>, predicate: F) -> Note
where
    F: Fn(&Note) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Some(note) if predicate(&note) => return note,
                Some(_) => continue,
                None => panic!("observer channel closed"),
            }
        }
    })
    .await
    .expect("observer note should arrive")
}

fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

/// A player whose pipeline is ready and whose duration has resolved.
async fn ready_player(
    pipeline: Arc<FakePipeline>,
    config: PlayerConfig,
) -> (MediaPlayer, Arc<Recorder>, mpsc::UnboundedReceiver<Note>) {
    let player = MediaPlayer::spawn(pipeline.clone(), config, None).expect("player should start");
    let (observer, mut notes) = recorder();
    player.set_observer(&observer);
    pipeline.set_status(PipelineStatus::ReadyToPlay);
    wait_for(&mut notes, |n| matches!(n, Note::Ready(_))).await;
    (player, observer, notes)
}

#[tokio::test]
async fn test_controls_are_rejected_until_ready() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let player = MediaPlayer::spawn(pipeline.clone(), PlayerConfig::default(), None).unwrap();

    assert!(!player.play().await);
    assert!(!player.pause().await);
    assert!(!player.stop().await);
    assert!(!player.mute().await);
    assert!(!player.seek(secs(3)).await);
    assert!(!pipeline.is_playing());
    assert!(pipeline.seeks().is_empty());
    assert!(!player.snapshot().is_ready());
}

#[tokio::test]
async fn test_ready_reports_resolved_duration() {
    let pipeline = FakePipeline::new(Some(secs(42)));
    let (player, _observer, _notes) = ready_player(pipeline, PlayerConfig::default()).await;

    assert!(eventually(|| player.snapshot().duration == Some(secs(42))).await);
    assert!(player.snapshot().is_ready());
}

#[tokio::test]
async fn test_play_and_pause_report_state_changes() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let (player, _observer, _notes) =
        ready_player(pipeline.clone(), PlayerConfig::default()).await;

    assert!(player.play().await);
    assert!(pipeline.is_playing());
    assert!(!player.play().await);

    assert!(player.pause().await);
    assert!(!pipeline.is_playing());
    assert!(!player.pause().await);
}

#[tokio::test]
async fn test_mute_restores_previous_volume() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    pipeline.set_volume(0.7);
    let (player, _observer, _notes) =
        ready_player(pipeline.clone(), PlayerConfig::default()).await;

    assert!(player.mute().await);
    assert_eq!(pipeline.volume(), 0.0);
    assert!(!player.mute().await);
    assert!(eventually(|| player.snapshot().is_muted).await);

    assert!(player.unmute().await);
    assert!((pipeline.volume() - 0.7).abs() < f32::EPSILON);
    assert!(!player.unmute().await);
}

#[tokio::test]
async fn test_auto_play_starts_once_ready() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let config = PlayerConfig::default().with_auto_play(true);
    let (player, _observer, _notes) = ready_player(pipeline.clone(), config).await;

    assert!(eventually(|| pipeline.is_playing()).await);
    assert!(eventually(|| player.snapshot().is_playing).await);
}

#[tokio::test]
async fn test_progress_reaching_duration_finishes_playback() {
    let pipeline = FakePipeline::new(Some(Duration::from_millis(500)));
    let config = PlayerConfig::default().with_progress_interval(Duration::from_millis(20));
    let (player, _observer, mut notes) = ready_player(pipeline.clone(), config).await;

    pipeline.set_position(Duration::from_millis(200));
    assert!(player.play().await);
    wait_for(&mut notes, |n| *n == Note::Progress(Duration::from_millis(200))).await;

    pipeline.set_position(Duration::from_millis(500));
    wait_for(&mut notes, |n| *n == Note::Finished).await;

    let snapshot = player.snapshot();
    assert!(!snapshot.is_playing);
    assert_eq!(snapshot.progress, Duration::ZERO);
    assert!(!pipeline.is_playing());
    assert!(eventually(|| pipeline.seeks().contains(&Duration::ZERO)).await);
}

#[tokio::test]
async fn test_unknown_duration_never_finishes() {
    let pipeline = FakePipeline::new(None);
    let config = PlayerConfig::default().with_progress_interval(Duration::from_millis(10));
    let (player, _observer, mut notes) = ready_player(pipeline.clone(), config).await;

    pipeline.set_position(secs(3600));
    assert!(player.play().await);
    wait_for(&mut notes, |n| *n == Note::Progress(secs(3600))).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(player.snapshot().is_playing);
    while let Ok(note) = notes.try_recv() {
        assert_ne!(note, Note::Finished);
    }
}

#[tokio::test]
async fn test_stop_rewinds_and_reports_zero_progress() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let (player, _observer, mut notes) =
        ready_player(pipeline.clone(), PlayerConfig::default()).await;

    assert!(player.play().await);
    assert!(player.stop().await);
    wait_for(&mut notes, |n| *n == Note::Progress(Duration::ZERO)).await;

    assert!(!pipeline.is_playing());
    assert!(eventually(|| pipeline.seeks() == vec![Duration::ZERO]).await);
}

#[tokio::test]
async fn test_seek_burst_converges_on_last_target() {
    let pipeline = FakePipeline::gated(Some(secs(60)));
    let (player, _observer, _notes) =
        ready_player(pipeline.clone(), PlayerConfig::default()).await;
    assert!(player.play().await);

    let first = {
        let player = player.clone();
        tokio::spawn(async move { player.seek(secs(10)).await })
    };
    assert!(eventually(|| pipeline.seeks() == vec![secs(10)]).await);
    assert!(!pipeline.is_playing());

    // Later requests only move the target and complete at once
    assert!(player.seek(secs(20)).await);
    assert!(player.seek(secs(30)).await);
    assert!(eventually(|| player.snapshot().chase_target == Some(secs(30))).await);
    assert!(player.snapshot().seek_in_flight);

    pipeline.release_seek();
    assert!(eventually(|| pipeline.seeks() == vec![secs(10), secs(30)]).await);
    assert!(!first.is_finished());

    pipeline.release_seek();
    assert!(first.await.unwrap());

    // Playback resumes because it was active when the burst started
    assert!(eventually(|| pipeline.is_playing()).await);
    assert!(eventually(|| !player.snapshot().seek_in_flight).await);
    assert_eq!(pipeline.seeks(), vec![secs(10), secs(30)]);
}

#[tokio::test]
async fn test_seek_to_current_target_issues_nothing() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let (player, _observer, _notes) =
        ready_player(pipeline.clone(), PlayerConfig::default()).await;

    assert!(player.seek(secs(5)).await);
    assert!(player.seek(secs(5)).await);
    assert_eq!(pipeline.seeks(), vec![secs(5)]);
    assert!(!pipeline.is_playing());
}

#[tokio::test]
async fn test_stop_abandons_seek_in_flight() {
    let pipeline = FakePipeline::gated(Some(secs(60)));
    let (player, _observer, _notes) =
        ready_player(pipeline.clone(), PlayerConfig::default()).await;

    let pending = {
        let player = player.clone();
        tokio::spawn(async move { player.seek(secs(10)).await })
    };
    assert!(eventually(|| pipeline.seeks() == vec![secs(10)]).await);

    assert!(player.stop().await);
    assert!(!pending.await.unwrap());
    assert!(eventually(|| player.snapshot().chase_target.is_none()).await);

    // The stale seek finishing later does not resume anything
    pipeline.release_seek();
    pipeline.release_seek();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!pipeline.is_playing());
}

#[tokio::test]
async fn test_pipeline_failure_is_reported() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let bus = EventBus::new(32);
    let mut events = bus.subscribe();
    let player =
        MediaPlayer::spawn(pipeline.clone(), PlayerConfig::default(), Some(bus)).unwrap();
    let (observer, mut notes) = recorder();
    player.set_observer(&observer);

    pipeline.set_status(PipelineStatus::Failed {
        message: "unsupported codec".to_string(),
    });

    let note = wait_for(&mut notes, |n| matches!(n, Note::Failed(_))).await;
    assert_eq!(note, Note::Failed("unsupported codec".to_string()));
    assert!(!player.play().await);

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::Failed { ref message, .. }) if message == "unsupported codec"
    ));
}

#[tokio::test]
async fn test_dropped_observer_is_not_called() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    let player = MediaPlayer::spawn(pipeline.clone(), PlayerConfig::default(), None).unwrap();
    let (observer, mut notes) = recorder();
    player.set_observer(&observer);
    drop(observer);

    pipeline.set_status(PipelineStatus::ReadyToPlay);
    assert!(eventually(|| player.snapshot().duration.is_some()).await);

    // The recorder (and its sender) is gone
    assert!(notes.recv().await.is_none());
}

#[tokio::test]
async fn test_observer_attached_after_spawn_hears_earlier_failure() {
    let pipeline = FakePipeline::new(Some(secs(60)));
    pipeline.set_status(PipelineStatus::Failed {
        message: "network lost".to_string(),
    });

    let player = MediaPlayer::spawn(pipeline.clone(), PlayerConfig::default(), None).unwrap();
    let (observer, mut notes) = recorder();
    player.set_observer(&observer);

    let note = wait_for(&mut notes, |n| matches!(n, Note::Failed(_))).await;
    assert_eq!(note, Note::Failed("network lost".to_string()));
    assert!(!player.play().await);
}

#[tokio::test]
async fn test_observer_attached_after_spawn_hears_earlier_readiness() {
    let pipeline = FakePipeline::new(Some(secs(12)));
    pipeline.set_status(PipelineStatus::ReadyToPlay);

    let player = MediaPlayer::spawn(pipeline.clone(), PlayerConfig::default(), None).unwrap();
    let (observer, mut notes) = recorder();
    player.set_observer(&observer);

    let note = wait_for(&mut notes, |n| matches!(n, Note::Ready(_))).await;
    assert_eq!(note, Note::Ready(Some(secs(12))));
    assert!(player.play().await);
}
