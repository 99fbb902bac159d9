//! # Playback & Streaming Module
//!
//! Progressive media caching and playback control.
//!
//! ## Overview
//!
//! This module handles:
//! - Serving a pipeline's byte-range reads from a single growing download
//!   ([`loader`]), then persisting the payload to the documents directory
//! - Driving an opaque media pipeline: readiness, transport, progress
//!   sampling and seek chasing ([`player`])
//! - One-shot export of a remote asset to a local file ([`export`])
//!
//! Every long-lived component is an actor: a cloneable handle sends commands
//! to a driver task that owns the state, so reads, transfer events and player
//! notifications are applied one at a time.

pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod location;
pub mod player;

pub use config::{LoaderConfig, PlayerConfig, DEFAULT_SCHEME_SUFFIX};
pub use error::{PlaybackError, Result};
pub use export::ExportSession;
pub use loader::{
    CacheDependencies, CacheDriver, CacheSnapshot, ContentInfo, LoadingRequest, ReadHandle,
    ReadOutcome, ReadResponder, RequestId, StreamingCache,
};
pub use player::{MediaPlayer, PlayerDriver, PlayerObserver, PlayerSnapshot};
