//! # Loader and Player Configuration
//!
//! Configuration types for the streaming cache and the media player. Both are
//! serde-deserialisable so a host can ship them in its own settings file;
//! every field has a default.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheme suffix marking a URL as served by the streaming cache.
pub const DEFAULT_SCHEME_SUFFIX: &str = "-demoloader";

/// Streaming cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Suffix appended to the remote scheme to form the cache-handled URL.
    ///
    /// Default: `-demoloader` (`https` becomes `https-demoloader`).
    #[serde(default = "default_scheme_suffix")]
    pub scheme_suffix: String,

    /// Overall timeout for the single download.
    ///
    /// Default: none. A progressive download lives as long as the media is
    /// being fetched; only the connect timeout of the HTTP client applies.
    #[serde(default)]
    pub request_timeout: Option<Duration>,

    /// Whether a completed download is written to the documents directory.
    ///
    /// Default: true.
    #[serde(default = "default_persist_to_documents")]
    pub persist_to_documents: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            scheme_suffix: default_scheme_suffix(),
            request_timeout: None,
            persist_to_documents: default_persist_to_documents(),
        }
    }
}

impl LoaderConfig {
    /// Validate configuration values.
    ///
    /// The suffix must keep the rewritten scheme a legal URL scheme, so it may
    /// only contain ASCII letters, digits, `+`, `-` and `.`.
    pub fn validate(&self) -> Result<()> {
        if self.scheme_suffix.is_empty() {
            return Err(PlaybackError::InvalidConfig(
                "scheme_suffix must not be empty".to_string(),
            ));
        }

        if !self
            .scheme_suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(PlaybackError::InvalidConfig(format!(
                "scheme_suffix '{}' contains characters not allowed in a URL scheme",
                self.scheme_suffix
            )));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(PlaybackError::InvalidConfig(
                "request_timeout must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Media player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Interval between playhead samples while playing.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: Duration,

    /// Start playback once the media first becomes ready.
    ///
    /// One-shot: cleared after it fires. Default: false.
    #[serde(default)]
    pub auto_play: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            auto_play: false,
        }
    }
}

impl PlayerConfig {
    /// Enable the one-shot auto play flag.
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    /// Set the playhead sampling interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "progress_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_scheme_suffix() -> String {
    DEFAULT_SCHEME_SUFFIX.to_string()
}

fn default_persist_to_documents() -> bool {
    true
}

fn default_progress_interval() -> Duration {
    Duration::from_millis(100)
}
