//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpStream};
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bridge_traits::{MediaPipeline, PipelineStatus};
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};

pub const DOCS: &str = "/virtual/documents";

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// ============================================================================
// HTTP
// ============================================================================

/// Serves one response whose body the test feeds chunk by chunk.
pub struct ScriptedHttpClient {
    status: u16,
    headers: HashMap<String, String>,
    body: Mutex<Option<mpsc::UnboundedReceiver<BridgeResult<Bytes>>>>,
    requests: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

/// Test side of a [`ScriptedHttpClient`] body. Dropping it ends the body.
pub struct BodyFeed {
    tx: mpsc::UnboundedSender<BridgeResult<Bytes>>,
}

impl BodyFeed {
    pub fn push(&self, chunk: &'static [u8]) {
        let _ = self.tx.send(Ok(Bytes::from_static(chunk)));
    }

    pub fn fail(self, message: &str) {
        let _ = self
            .tx
            .send(Err(BridgeError::OperationFailed(message.to_string())));
    }

    pub fn end(self) {}
}

impl ScriptedHttpClient {
    pub fn new(status: u16, content_type: &str, content_length: Option<u64>) -> (Arc<Self>, BodyFeed) {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        if let Some(length) = content_length {
            headers.insert("Content-Length".to_string(), length.to_string());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(Self {
            status,
            headers,
            body: Mutex::new(Some(rx)),
            requests: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        });
        (client, BodyFeed { tx })
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn stream(&self, request: HttpRequest) -> BridgeResult<HttpStream> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock() = Some(request.url.clone());

        let rx = self
            .body
            .lock()
            .take()
            .ok_or_else(|| BridgeError::OperationFailed("body already taken".to_string()))?;

        let body = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        });

        Ok(HttpStream::new(
            self.status,
            self.headers.clone(),
            Box::pin(body),
        ))
    }
}

// ============================================================================
// File system
// ============================================================================

/// In-memory documents directory.
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, Bytes>>,
}

impl MemoryFileSystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, path: impl Into<PathBuf>, data: &'static [u8]) {
        self.files.lock().insert(path.into(), Bytes::from_static(data));
    }

    pub fn get(&self, path: &Path) -> Option<Bytes> {
        self.files.lock().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn get_documents_directory(&self) -> BridgeResult<PathBuf> {
        Ok(PathBuf::from(DOCS))
    }

    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        Ok(self.files.lock().contains_key(path))
    }

    async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
        let files = self.files.lock();
        let data = files
            .get(path)
            .ok_or_else(|| BridgeError::OperationFailed("no such file".to_string()))?;
        Ok(FileMetadata {
            size: data.len() as u64,
            modified_at: None,
            is_directory: false,
        })
    }

    async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        self.get(path)
            .ok_or_else(|| BridgeError::OperationFailed("no such file".to_string()))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
        self.files.lock().insert(path.to_path_buf(), data);
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
        self.files.lock().remove(path);
        Ok(())
    }
}

// ============================================================================
// Media pipeline
// ============================================================================

/// Scriptable pipeline. Seeks complete immediately unless gated, in which
/// case each seek waits for one [`FakePipeline::release_seek`].
pub struct FakePipeline {
    status: watch::Sender<PipelineStatus>,
    duration: Option<Duration>,
    state: Mutex<PipelineState>,
    gate: Option<Semaphore>,
}

#[derive(Default)]
struct PipelineState {
    playing: bool,
    volume: f32,
    position: Duration,
    seeks: Vec<Duration>,
}

impl FakePipeline {
    pub fn new(duration: Option<Duration>) -> Arc<Self> {
        Self::build(duration, None)
    }

    pub fn gated(duration: Option<Duration>) -> Arc<Self> {
        Self::build(duration, Some(Semaphore::new(0)))
    }

    fn build(duration: Option<Duration>, gate: Option<Semaphore>) -> Arc<Self> {
        let (status, _) = watch::channel(PipelineStatus::Unknown);
        Arc::new(Self {
            status,
            duration,
            state: Mutex::new(PipelineState {
                volume: 1.0,
                ..PipelineState::default()
            }),
            gate,
        })
    }

    pub fn set_status(&self, status: PipelineStatus) {
        self.status.send_replace(status);
    }

    pub fn set_position(&self, position: Duration) {
        self.state.lock().position = position;
    }

    pub fn release_seek(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.state.lock().seeks.clone()
    }
}

#[async_trait]
impl MediaPipeline for FakePipeline {
    fn status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }

    fn play(&self) {
        self.state.lock().playing = true;
    }

    fn pause(&self) {
        self.state.lock().playing = false;
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn current_time(&self) -> Duration {
        self.state.lock().position
    }

    async fn duration(&self) -> Option<Duration> {
        self.duration
    }

    async fn seek(&self, position: Duration) -> bool {
        self.state.lock().seeks.push(position);
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return false,
            }
        }
        self.state.lock().position = position;
        true
    }
}
