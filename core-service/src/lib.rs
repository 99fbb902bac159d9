//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! asset exporter) and a validated [`CoreConfig`] into the media cache core.
//! Desktop apps typically enable the `desktop-shims` feature (which pulls in
//! `bridge-desktop`) and call [`CoreService::desktop`]; other hosts build a
//! config with their own bridges.
//!
//! ```ignore
//! let core = CoreService::desktop()?;
//! let cache = core.streaming_cache("https://cdn.example.com/bbb.mp4", |path| {
//!     tracing::info!(?path, "Download finished");
//! })?;
//! let player = core.media_player(pipeline)?;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::path::PathBuf;
use std::sync::Arc;

use bridge_traits::{AssetExporter, FileSystemAccess, HttpClient, MediaPipeline};
use core_playback::{
    CacheDependencies, ExportSession, LoaderConfig, MediaPlayer, PlayerConfig, StreamingCache,
};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use tracing::{debug, info};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub file_system: Arc<dyn FileSystemAccess>,
    pub asset_exporter: Option<Arc<dyn AssetExporter>>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        file_system: Arc<dyn FileSystemAccess>,
        asset_exporter: Option<Arc<dyn AssetExporter>>,
    ) -> Self {
        Self {
            http_client,
            file_system,
            asset_exporter,
        }
    }
}

impl From<&CoreConfig> for CoreDependencies {
    fn from(config: &CoreConfig) -> Self {
        Self::new(
            Arc::clone(&config.http_client),
            Arc::clone(&config.file_system),
            config.asset_exporter.clone(),
        )
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    documents_dir: Option<PathBuf>,
    features: FeatureFlags,
    event_bus: EventBus,
    loader: LoaderConfig,
    player: PlayerConfig,
}

impl CoreService {
    /// Create a service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let service = Self {
            deps: Arc::new(CoreDependencies::from(&config)),
            documents_dir: config.documents_dir.clone(),
            features: config.features,
            event_bus: EventBus::new(config.event_buffer_size),
            loader: LoaderConfig::default(),
            player: PlayerConfig::default(),
        };

        info!(features = ?service.features, "Core service initialized");
        Ok(service)
    }

    /// Create a service backed by the desktop bridges.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop() -> Result<Self> {
        Self::new(CoreConfig::builder().build()?)
    }

    /// Replace the defaults used for new cache sessions.
    pub fn with_loader_config(mut self, loader: LoaderConfig) -> Result<Self> {
        loader.validate()?;
        self.loader = loader;
        Ok(self)
    }

    /// Replace the defaults used for new players.
    pub fn with_player_config(mut self, player: PlayerConfig) -> Result<Self> {
        player.validate()?;
        self.player = player;
        Ok(self)
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn features(&self) -> &FeatureFlags {
        &self.features
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe_events(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }

    /// Start a cache session for `remote_url`.
    ///
    /// `on_complete` receives the persisted path, or `None` when the payload
    /// was not persisted.
    pub fn streaming_cache<F>(&self, remote_url: &str, on_complete: F) -> Result<StreamingCache>
    where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        let mut deps = CacheDependencies::new(
            Arc::clone(&self.deps.http_client),
            Arc::clone(&self.deps.file_system),
        );
        if let Some(dir) = &self.documents_dir {
            deps = deps.with_documents_dir(dir.clone());
        }
        if let Some(bus) = self.bus() {
            deps = deps.with_event_bus(bus);
        }

        let mut loader = self.loader.clone();
        loader.persist_to_documents &= self.features.persist_downloads;

        let cache = StreamingCache::spawn(remote_url, deps, loader, on_complete)?;
        debug!(session = cache.session_id(), "Streaming cache created");
        Ok(cache)
    }

    /// Start a player driving `pipeline`.
    pub fn media_player(&self, pipeline: Arc<dyn MediaPipeline>) -> Result<MediaPlayer> {
        let player = MediaPlayer::spawn(pipeline, self.player.clone(), self.bus())?;
        debug!(player = player.id(), "Media player created");
        Ok(player)
    }

    /// Export `remote_url` to the documents directory.
    pub async fn export(&self, remote_url: &str) -> Result<ExportSession> {
        let exporter = match (&self.deps.asset_exporter, self.features.enable_export) {
            (Some(exporter), true) => Arc::clone(exporter),
            _ => {
                return Err(CoreError::CapabilityMissing {
                    capability: "AssetExporter".to_string(),
                    message: "Export is disabled or no exporter was provided".to_string(),
                })
            }
        };

        let session = ExportSession::start(
            remote_url,
            exporter,
            Arc::clone(&self.deps.file_system),
            self.documents_dir.as_deref(),
            self.bus(),
        )
        .await?;
        Ok(session)
    }

    fn bus(&self) -> Option<EventBus> {
        self.features.emit_events.then(|| self.event_bus.clone())
    }
}
