//! # Playback Error Types
//!
//! Error types for the streaming cache, the player and the export path.
//!
//! Most control operations report a boolean outcome instead of an error; a
//! `PlaybackError` only surfaces where something can fail for a reason the
//! caller needs to see (a malformed URL, a failed transfer, an unwritable
//! documents directory).

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during cache, playback and export operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// URL could not be parsed or has no scheme to rewrite.
    #[error("Invalid media URL: {0}")]
    InvalidUrl(String),

    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// The download failed before the body was complete.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// The server answered with a non-success status.
    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    // ========================================================================
    // Storage / Export Errors
    // ========================================================================
    /// The completed download could not be written to the documents directory.
    #[error("Failed to persist download: {0}")]
    PersistFailed(String),

    /// The exporter rejected or failed the export.
    #[error("Export failed: {0}")]
    ExportFailed(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Host bridge reported an error.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::TransferFailed(_) | PlaybackError::HttpStatus(_)
        )
    }

    /// Returns `true` if this error left no local copy behind.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::PersistFailed(_) | PlaybackError::ExportFailed(_) | PlaybackError::Io(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
