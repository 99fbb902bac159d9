//! # Core Configuration Module
//!
//! Provides configuration management for the media cache core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the host bridges and settings the streaming cache,
//! player and exporter need. It enforces fail-fast validation so a missing
//! bridge is reported at startup rather than on the first download.
//!
//! ## Bridges (with platform defaults)
//!
//! - `HttpClient` - chunked downloads (desktop default: reqwest)
//! - `FileSystemAccess` - persisted copies (desktop default: tokio fs)
//! - `AssetExporter` - optional, required only when export is enabled
//!
//! When the `desktop-shims` feature is enabled, desktop implementations are
//! injected automatically for any bridge that was not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .file_system(Arc::new(MyFileSystem))
//!     .documents_dir("/data/media")
//!     .event_buffer_size(256)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! // Without desktop shims there is no HTTP client to fall back to:
//! // Err(CapabilityMissing { capability: "HttpClient", .. })
//! let result = CoreConfig::builder().build();
//! assert!(result.is_err());
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{AssetExporter, FileSystemAccess, HttpClient};
use std::path::PathBuf;
use std::sync::Arc;

/// Upper bound for the event bus capacity.
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Core configuration for the media cache core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Overrides the bridge's documents directory for persisted downloads
    /// and exports.
    pub documents_dir: Option<PathBuf>,

    /// HTTP client used for the single download of each cache session
    pub http_client: Arc<dyn HttpClient>,

    /// File system access for persisted copies
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Exporter for the export path (required when export is enabled)
    pub asset_exporter: Option<Arc<dyn AssetExporter>>,

    /// Capacity of the broadcast event bus
    pub event_buffer_size: usize,

    /// Features flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("documents_dir", &self.documents_dir)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field(
                "asset_exporter",
                &self
                    .asset_exporter
                    .as_ref()
                    .map(|_| "AssetExporter { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Enable the export path (requires an AssetExporter)
    pub enable_export: bool,

    /// Write completed downloads to the documents directory
    pub persist_downloads: bool,

    /// Publish cache/playback/export events on the event bus
    pub emit_events: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_export: false,
            persist_downloads: true,
            emit_events: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Documents directory override is not empty
    /// - Event buffer size is reasonable (> 0 and <= 10,000)
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.documents_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(
                    "Documents directory cannot be empty".to_string(),
                ));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        if self.features.enable_export && self.asset_exporter.is_none() {
            return Err(Error::Config(
                "Export enabled but no AssetExporter provided. \
                 Disable the feature or inject an AssetExporter implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for media downloads. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Mobile: inject the platform's URL session."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required for persisted downloads. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default TokioFileSystem. \
                 Mobile: inject sandbox-aware file access."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system(
    documents_dir: Option<&PathBuf>,
) -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs = match documents_dir {
        Some(dir) => TokioFileSystem::with_documents_directory(dir.clone()),
        None => TokioFileSystem::new(),
    };
    let fs: Arc<dyn FileSystemAccess> = Arc::new(fs);
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system(
    _documents_dir: Option<&PathBuf>,
) -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_exporter() -> Result<Option<Arc<dyn AssetExporter>>> {
    use bridge_desktop::StreamCopyExporter;

    let exporter: Arc<dyn AssetExporter> = Arc::new(StreamCopyExporter::with_default_client()?);
    Ok(Some(exporter))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_exporter() -> Result<Option<Arc<dyn AssetExporter>>> {
    Ok(None)
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the
/// final config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    documents_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    asset_exporter: Option<Arc<dyn AssetExporter>>,
    event_buffer_size: Option<usize>,
    features: Option<FeatureFlags>,
}

impl CoreConfigBuilder {
    /// Sets the directory persisted downloads and exports are written to.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .documents_dir("/data/media");
    /// ```
    pub fn documents_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.documents_dir = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the asset exporter and enables export.
    pub fn asset_exporter(mut self, exporter: Arc<dyn AssetExporter>) -> Self {
        self.asset_exporter = Some(exporter);
        self.features.get_or_insert_with(FeatureFlags::default).enable_export = true;
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enables or disables the export path.
    pub fn enable_export(mut self, enabled: bool) -> Self {
        self.features.get_or_insert_with(FeatureFlags::default).enable_export = enabled;
        self
    }

    /// Enables or disables persisting completed downloads.
    ///
    /// Default: true
    pub fn persist_downloads(mut self, enabled: bool) -> Self {
        self.features
            .get_or_insert_with(FeatureFlags::default)
            .persist_downloads = enabled;
        self
    }

    /// Enables or disables event bus publishing.
    ///
    /// Default: true
    pub fn emit_events(mut self, enabled: bool) -> Self {
        self.features.get_or_insert_with(FeatureFlags::default).emit_events = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = Some(features);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing and no desktop default is available
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let features = self.features.unwrap_or_default();

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system(self.documents_dir.as_ref())?,
        };

        let asset_exporter = match self.asset_exporter {
            Some(exporter) => Some(exporter),
            None if features.enable_export => provide_default_exporter()?,
            None => None,
        };

        let config = CoreConfig {
            documents_dir: self.documents_dir,
            http_client,
            file_system,
            asset_exporter,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features,
        };

        config.validate()?;

        Ok(config)
    }
}
