//! # Event Bus System
//!
//! Broadcast-style notifications for the media cache core, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for each component
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! Components publish here in addition to their direct observers. A UI layer
//! that only needs "player became ready" or "progress changed" subscribes to
//! the bus instead of implementing an observer trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   emit   ┌───────────┐
//! │ StreamingCache ├─────────>│           │
//! └────────────────┘          │           │   subscribe   ┌────────────┐
//!                             │ EventBus  ├──────────────>│ Subscriber │
//! ┌────────────────┐   emit   │ (broadcast│               └────────────┘
//! │  MediaPlayer   ├─────────>│  channel) │   subscribe   ┌────────────┐
//! └────────────────┘          │           ├──────────────>│ Subscriber │
//! ┌────────────────┐   emit   │           │               └────────────┘
//! │ ExportSession  ├─────────>│           │
//! └────────────────┘          └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Playback(PlaybackEvent::Finished {
//!         player_id: "player-1".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Playback finished");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Progress events are frequent; subscribers should treat this as non-fatal.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Publishers ignore the "no subscribers" error from [`EventBus::emit`].

use serde::{Deserialize, Serialize};
use std::fmt;
use core_async::sync::broadcast;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Streaming cache download lifecycle
    Cache(CacheEvent),
    /// Playback controller state changes
    Playback(PlaybackEvent),
    /// Asset export lifecycle
    Export(ExportEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Cache(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Export(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Cache(CacheEvent::Failed { .. })
            | CoreEvent::Playback(PlaybackEvent::Failed { .. })
            | CoreEvent::Export(ExportEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Cache(CacheEvent::Invalidated { .. })
            | CoreEvent::Export(ExportEvent::Cancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Cache(CacheEvent::Persisted { .. })
            | CoreEvent::Playback(PlaybackEvent::ReadyToPlay { .. })
            | CoreEvent::Playback(PlaybackEvent::Finished { .. })
            | CoreEvent::Export(ExportEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Cache Events
// ============================================================================

/// Events published by a streaming cache session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// The single background transfer was started.
    TransferStarted {
        session_id: String,
        /// Remote URL with query and fragment removed.
        url: String,
    },
    /// Response headers arrived.
    ContentInfo {
        session_id: String,
        content_type: Option<String>,
        content_length: Option<u64>,
    },
    /// More bytes were buffered.
    DownloadProgress {
        session_id: String,
        bytes_received: u64,
        total_bytes: Option<u64>,
        /// Progress percentage (0-100), when the total is known.
        percent: Option<u8>,
    },
    /// The full payload was written to local storage.
    Persisted {
        session_id: String,
        path: String,
        bytes: u64,
    },
    /// The transfer or persistence failed; no local copy exists.
    Failed { session_id: String, message: String },
    /// The session was invalidated before the transfer finished.
    Invalidated {
        session_id: String,
        /// Reads that were force-finished.
        pending_reads: usize,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::TransferStarted { .. } => "Cache transfer started",
            CacheEvent::ContentInfo { .. } => "Cache content info received",
            CacheEvent::DownloadProgress { .. } => "Cache download progress",
            CacheEvent::Persisted { .. } => "Cached copy persisted",
            CacheEvent::Failed { .. } => "Cache transfer failed",
            CacheEvent::Invalidated { .. } => "Cache session invalidated",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events published by a playback controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The pipeline became ready and the duration is resolved.
    ReadyToPlay {
        player_id: String,
        /// Duration (milliseconds), absent when indefinite.
        duration_ms: Option<u64>,
    },
    /// A progress sample was taken while playing, or progress was reset.
    ProgressChanged {
        player_id: String,
        position_ms: u64,
        duration_ms: Option<u64>,
    },
    /// A burst of seeks converged on its final target.
    SeekCompleted { player_id: String, position_ms: u64 },
    /// Playback reached the end of the media.
    Finished { player_id: String },
    /// The pipeline reported a failure.
    Failed { player_id: String, message: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::ReadyToPlay { .. } => "Player ready to play",
            PlaybackEvent::ProgressChanged { .. } => "Playback progress changed",
            PlaybackEvent::SeekCompleted { .. } => "Seek completed",
            PlaybackEvent::Finished { .. } => "Playback finished",
            PlaybackEvent::Failed { .. } => "Playback failed",
        }
    }
}

// ============================================================================
// Export Events
// ============================================================================

/// Events published by an asset export session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ExportEvent {
    Started {
        export_id: String,
        output_path: String,
    },
    Completed {
        export_id: String,
        output_path: String,
    },
    Failed { export_id: String, message: String },
    Cancelled { export_id: String },
}

impl ExportEvent {
    fn description(&self) -> &str {
        match self {
            ExportEvent::Started { .. } => "Export started",
            ExportEvent::Completed { .. } => "Export completed",
            ExportEvent::Failed { .. } => "Export failed",
            ExportEvent::Cancelled { .. } => "Export cancelled",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` is the number of events buffered per subscriber before it
    /// starts lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(100);
/// let playback_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
