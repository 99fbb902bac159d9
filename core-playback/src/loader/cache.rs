//! # Streaming Cache
//!
//! Serves the pipeline's byte-range reads from a buffer that a single
//! background download is still filling, then persists the full payload.
//!
//! ## Architecture
//!
//! ```text
//!  pipeline ──load/cancel──> StreamingCache ──Command──┐
//!                              (handle)                ▼
//!                                              ┌──────────────┐  TransferEvent  ┌───────────────┐
//!                                              │ CacheDriver  │<────────────────│ transfer task │
//!                                              │ DownloadSess.│                 │ HttpClient    │
//!                                              └──────┬───────┘                 └───────────────┘
//!                                                     │ respond / finish
//!                                                     ▼
//!                                              ReadResponder (per read)
//! ```
//!
//! The handle never blocks: `load` only enqueues. The driver owns the
//! session and applies commands and transfer events one at a time in
//! delivery order. The host decides where the driver runs
//! ([`CacheDriver::run`]) or uses [`StreamingCache::spawn`].
//!
//! ## Usage
//!
//! ```ignore
//! let cache = StreamingCache::spawn(
//!     "https://cdn.example.com/media/bbb-360p.mp4",
//!     CacheDependencies::new(http_client, file_system),
//!     LoaderConfig::default(),
//!     |local_path| tracing::info!(?local_path, "Cache finished"),
//! )?;
//!
//! // Hand cache.streaming_url() to the pipeline; forward its reads:
//! let (request, handle) = LoadingRequest::range(0, 64 * 1024);
//! cache.load(request);
//! let outcome = handle.collect().await;
//! ```

use crate::config::LoaderConfig;
use crate::error::{PlaybackError, Result};
use crate::loader::request::{ContentInfo, LoadingRequest, RequestId};
use crate::loader::session::{DownloadSession, SessionSnapshot, SessionState};
use crate::location;
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use core_async::sync::{mpsc, CancellationToken};
use core_async::task::JoinHandle;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use core_runtime::logging::{redact_url, strip_path};
use futures::StreamExt;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

/// Progress events without a known total are emitted every this many bytes.
const PROGRESS_STEP_BYTES: u64 = 256 * 1024;

/// Called exactly once per session with the persisted path, or `None`.
pub type CompletionHandler = Box<dyn FnOnce(Option<PathBuf>) + Send + 'static>;

/// Host bridges used by a cache session.
#[derive(Clone)]
pub struct CacheDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub file_system: Arc<dyn FileSystemAccess>,
    /// Overrides the bridge's documents directory.
    pub documents_dir: Option<PathBuf>,
    pub event_bus: Option<EventBus>,
}

impl CacheDependencies {
    pub fn new(http_client: Arc<dyn HttpClient>, file_system: Arc<dyn FileSystemAccess>) -> Self {
        Self {
            http_client,
            file_system,
            documents_dir: None,
            event_bus: None,
        }
    }

    pub fn with_documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.documents_dir = Some(dir.into());
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }
}

/// Point-in-time view of a cache session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub session_id: String,
    pub session: SessionSnapshot,
    /// Where the payload was persisted, once it has been.
    pub local_path: Option<PathBuf>,
    pub invalidated: bool,
    /// The completion handler has fired.
    pub completed: bool,
}

enum Command {
    Load(LoadingRequest),
    Cancel(RequestId),
    Invalidate,
}

enum TransferEvent {
    Headers(ContentInfo),
    Chunk(Bytes),
    Finished(Result<()>),
}

struct Transfer {
    events: mpsc::UnboundedReceiver<TransferEvent>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

// ============================================================================
// StreamingCache (handle)
// ============================================================================

/// Cloneable handle to one cache session.
#[derive(Clone)]
pub struct StreamingCache {
    session_id: String,
    remote_url: Url,
    streaming_url: Url,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: Arc<Mutex<CacheSnapshot>>,
}

impl StreamingCache {
    /// Create a cache session for `remote_url` and its driver.
    ///
    /// Nothing is downloaded until the first read is loaded.
    pub fn new<F>(
        remote_url: &str,
        deps: CacheDependencies,
        config: LoaderConfig,
        on_complete: F,
    ) -> Result<(Self, CacheDriver)>
    where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        config.validate()?;
        let remote = location::parse_remote(remote_url)?;
        let streaming = location::streaming_url(&remote, &config.scheme_suffix)?;
        let session_id = uuid::Uuid::new_v4().to_string();

        let snapshot = Arc::new(Mutex::new(CacheSnapshot {
            session_id: session_id.clone(),
            session: SessionSnapshot::default(),
            local_path: None,
            invalidated: false,
            completed: false,
        }));

        let (tx, rx) = mpsc::unbounded_channel();

        let driver = CacheDriver {
            session_id: session_id.clone(),
            remote: remote.clone(),
            commands: rx,
            session: DownloadSession::new(),
            deps,
            config,
            completion: Some(Box::new(on_complete)),
            transfer: None,
            invalidated: false,
            snapshot: Arc::clone(&snapshot),
            progress: ProgressThrottle::default(),
        };

        let cache = Self {
            session_id,
            remote_url: remote,
            streaming_url: streaming,
            commands: tx,
            snapshot,
        };

        Ok((cache, driver))
    }

    /// Create a cache session and run its driver on the async runtime.
    pub fn spawn<F>(
        remote_url: &str,
        deps: CacheDependencies,
        config: LoaderConfig,
        on_complete: F,
    ) -> Result<Self>
    where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        let (cache, driver) = Self::new(remote_url, deps, config, on_complete)?;
        core_async::spawn(driver.run());
        Ok(cache)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The URL the network transfer fetches.
    pub fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    /// The cache-handled URL to give to the pipeline.
    pub fn streaming_url(&self) -> &Url {
        &self.streaming_url
    }

    /// Register a read. The first read starts the download.
    ///
    /// Always returns `true`: data is provided asynchronously through the
    /// request's responder. If the driver is gone the read is finished empty.
    pub fn load(&self, request: LoadingRequest) -> bool {
        if let Err(mpsc::error::SendError(Command::Load(mut request))) =
            self.commands.send(Command::Load(request))
        {
            request.responder().finish();
        }
        true
    }

    /// Remove a registered read. No-op if it is already finished or unknown.
    pub fn cancel(&self, id: RequestId) {
        let _ = self.commands.send(Command::Cancel(id));
    }

    /// Finish every pending read with what is buffered and stop the transfer.
    ///
    /// Idempotent. Reports `None` to the completion handler if the transfer
    /// had not completed yet.
    pub fn invalidate(&self) {
        let _ = self.commands.send(Command::Invalidate);
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.snapshot.lock().clone()
    }
}

impl fmt::Debug for StreamingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingCache")
            .field("session_id", &self.session_id)
            .field("streaming_url", &redact_url(self.streaming_url.as_str()))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CacheDriver
// ============================================================================

/// Owns the session state. Runs until every handle is dropped.
pub struct CacheDriver {
    session_id: String,
    remote: Url,
    commands: mpsc::UnboundedReceiver<Command>,
    session: DownloadSession,
    deps: CacheDependencies,
    config: LoaderConfig,
    completion: Option<CompletionHandler>,
    transfer: Option<Transfer>,
    invalidated: bool,
    snapshot: Arc<Mutex<CacheSnapshot>>,
    progress: ProgressThrottle,
}

enum Step {
    Command(Option<Command>),
    Transfer(Option<TransferEvent>),
}

impl CacheDriver {
    /// Process commands and transfer events until all handles are dropped.
    #[instrument(name = "streaming_cache", skip(self), fields(session = %self.session_id))]
    pub async fn run(mut self) {
        debug!(url = %redact_url(self.remote.as_str()), "Cache driver started");

        loop {
            let step = match self.transfer.as_mut() {
                Some(transfer) => core_async::select! {
                    biased;
                    command = self.commands.recv() => Step::Command(command),
                    event = transfer.events.recv() => Step::Transfer(event),
                },
                None => Step::Command(self.commands.recv().await),
            };

            match step {
                Step::Command(Some(command)) => self.handle_command(command),
                Step::Command(None) => {
                    self.invalidate();
                    self.publish_snapshot();
                    break;
                }
                Step::Transfer(Some(event)) => self.handle_transfer_event(event).await,
                Step::Transfer(None) => {
                    self.transfer = None;
                    if !self.session.state().is_terminal() {
                        self.finish_failed(PlaybackError::Internal(
                            "transfer task ended without a result".to_string(),
                        ));
                    }
                }
            }

            self.publish_snapshot();
        }

        debug!("Cache driver stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Load(request) => {
                trace!(read = %request.id(), range = ?request.byte_range(), "Read registered");
                if self.session.state() == SessionState::NotStarted
                    && self.transfer.is_none()
                    && !self.invalidated
                {
                    self.start_transfer();
                }
                self.session.register(request);
            }
            Command::Cancel(id) => {
                if self.session.cancel(id) {
                    trace!(read = %id, "Read cancelled");
                }
            }
            Command::Invalidate => self.invalidate(),
        }
    }

    fn start_transfer(&mut self) {
        let mut request = HttpRequest::get(self.remote.as_str());
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = core_async::spawn(run_transfer(
            Arc::clone(&self.deps.http_client),
            request,
            tx,
            cancel.clone(),
        ));

        self.transfer = Some(Transfer {
            events: rx,
            cancel,
            _task: task,
        });

        info!(url = %redact_url(self.remote.as_str()), "Transfer started");
        self.emit(CacheEvent::TransferStarted {
            session_id: self.session_id.clone(),
            url: redact_url(self.remote.as_str()),
        });
    }

    async fn handle_transfer_event(&mut self, event: TransferEvent) {
        match event {
            TransferEvent::Headers(info) => {
                debug!(
                    content_type = ?info.content_type,
                    content_length = ?info.content_length,
                    "Response headers received"
                );
                let event = CacheEvent::ContentInfo {
                    session_id: self.session_id.clone(),
                    content_type: info.content_type.clone(),
                    content_length: info.content_length,
                };
                if self.session.on_headers(info) {
                    self.emit(event);
                }
            }
            TransferEvent::Chunk(chunk) => {
                self.session.on_chunk(&chunk);
                self.report_progress();
            }
            TransferEvent::Finished(Ok(())) => {
                self.transfer = None;
                let data = self.session.complete();
                info!(bytes = data.len(), "Transfer completed");
                let local_path = self.persist(data).await;
                self.fire_completion(local_path);
            }
            TransferEvent::Finished(Err(err)) => {
                self.transfer = None;
                self.finish_failed(err);
            }
        }
    }

    fn finish_failed(&mut self, err: PlaybackError) {
        let cut_short = self.session.fail();
        warn!(
            error = %err,
            buffered = self.session.buffered().len(),
            cut_short,
            "Transfer failed"
        );
        self.emit(CacheEvent::Failed {
            session_id: self.session_id.clone(),
            message: err.to_string(),
        });
        self.fire_completion(None);
    }

    fn invalidate(&mut self) {
        if self.invalidated {
            return;
        }
        self.invalidated = true;

        if let Some(transfer) = self.transfer.take() {
            transfer.cancel.cancel();
        }

        let cut_short = self.session.fail();
        if self.completion.is_some() {
            debug!(cut_short, "Invalidated before completion");
            self.emit(CacheEvent::Invalidated {
                session_id: self.session_id.clone(),
                pending_reads: cut_short,
            });
        }
        self.fire_completion(None);
    }

    async fn persist(&mut self, data: Bytes) -> Option<PathBuf> {
        if !self.config.persist_to_documents {
            debug!("Persistence disabled; keeping no local copy");
            return None;
        }

        let size = data.len() as u64;
        let written = write_local_copy(
            self.deps.file_system.as_ref(),
            self.deps.documents_dir.as_deref(),
            &self.remote,
            data,
        )
        .await;

        match written {
            Ok(path) => {
                let shown = path.to_string_lossy().into_owned();
                info!(file = %strip_path(&shown), bytes = size, "Persisted cached copy");
                self.emit(CacheEvent::Persisted {
                    session_id: self.session_id.clone(),
                    path: shown,
                    bytes: size,
                });
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "Failed to persist cached copy");
                self.emit(CacheEvent::Failed {
                    session_id: self.session_id.clone(),
                    message: err.to_string(),
                });
                None
            }
        }
    }

    fn fire_completion(&mut self, local_path: Option<PathBuf>) {
        if let Some(handler) = self.completion.take() {
            self.snapshot.lock().local_path = local_path.clone();
            handler(local_path);
        }
    }

    fn report_progress(&mut self) {
        if self.deps.event_bus.is_none() {
            return;
        }
        let snapshot = self.session.snapshot();
        if let Some(percent) = self
            .progress
            .update(snapshot.bytes_buffered, snapshot.expected_length)
        {
            self.emit(CacheEvent::DownloadProgress {
                session_id: self.session_id.clone(),
                bytes_received: snapshot.bytes_buffered,
                total_bytes: snapshot.expected_length,
                percent,
            });
        }
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.deps.event_bus {
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }

    fn publish_snapshot(&self) {
        let mut snapshot = self.snapshot.lock();
        snapshot.session = self.session.snapshot();
        snapshot.invalidated = self.invalidated;
        snapshot.completed = self.completion.is_none();
    }
}

/// Stream the response into the driver until done or cancelled.
async fn run_transfer(
    http_client: Arc<dyn HttpClient>,
    request: HttpRequest,
    events: mpsc::UnboundedSender<TransferEvent>,
    cancel: CancellationToken,
) {
    let opened = core_async::select! {
        _ = cancel.cancelled() => return,
        opened = http_client.stream(request) => opened,
    };

    let mut response = match opened {
        Ok(response) => response,
        Err(err) => {
            let _ = events.send(TransferEvent::Finished(Err(PlaybackError::TransferFailed(
                err.to_string(),
            ))));
            return;
        }
    };

    if !response.is_success() {
        let _ = events.send(TransferEvent::Finished(Err(PlaybackError::HttpStatus(
            response.status,
        ))));
        return;
    }

    let info = ContentInfo {
        content_type: response.content_type(),
        content_length: response.content_length(),
        byte_range_access: true,
    };
    if events.send(TransferEvent::Headers(info)).is_err() {
        return;
    }

    loop {
        let next = core_async::select! {
            _ = cancel.cancelled() => return,
            next = response.body.next() => next,
        };

        let event = match next {
            Some(Ok(chunk)) => TransferEvent::Chunk(chunk),
            Some(Err(err)) => {
                TransferEvent::Finished(Err(PlaybackError::TransferFailed(err.to_string())))
            }
            None => TransferEvent::Finished(Ok(())),
        };
        let terminal = matches!(event, TransferEvent::Finished(_));

        if events.send(event).is_err() || terminal {
            return;
        }
    }
}

/// Write `data` to the documents directory under the remote file name,
/// replacing any existing file.
async fn write_local_copy(
    fs: &dyn FileSystemAccess,
    documents_dir: Option<&Path>,
    remote: &Url,
    data: Bytes,
) -> Result<PathBuf> {
    let name = location::local_file_name(remote).ok_or_else(|| {
        PlaybackError::PersistFailed(format!(
            "{} has no file name",
            redact_url(remote.as_str())
        ))
    })?;

    let dir = location::documents_dir(fs, documents_dir)
        .await
        .map_err(|e| PlaybackError::PersistFailed(e.to_string()))?;
    let path = dir.join(name);

    if fs.exists(&path).await.unwrap_or(false) {
        if let Err(err) = fs.delete_file(&path).await {
            warn!(error = %err, "Could not remove previous cached copy");
        }
    }

    fs.write_file(&path, data)
        .await
        .map_err(|e| PlaybackError::PersistFailed(e.to_string()))?;

    Ok(path)
}

#[derive(Default)]
struct ProgressThrottle {
    last_percent: Option<u8>,
    last_reported: u64,
}

impl ProgressThrottle {
    /// Returns `Some(percent)` when a progress event is due.
    fn update(&mut self, received: u64, total: Option<u64>) -> Option<Option<u8>> {
        match total {
            Some(total) if total > 0 => {
                let percent = (received.min(total) * 100 / total) as u8;
                if self.last_percent == Some(percent) {
                    return None;
                }
                self.last_percent = Some(percent);
                Some(Some(percent))
            }
            _ => {
                if received.saturating_sub(self.last_reported) < PROGRESS_STEP_BYTES {
                    return None;
                }
                self.last_reported = received;
                Some(None)
            }
        }
    }
}
