//! Tests for asset export

mod common;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bridge_traits::{AssetExporter, ContainerFormat, ExportRequest};
use bytes::Bytes;
use common::{MemoryFileSystem, DOCS};
use core_playback::{ExportSession, PlaybackError};
use core_runtime::events::{CoreEvent, EventBus, ExportEvent};
use mockall::mock;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Storage {}

    #[async_trait]
    impl FileSystemAccess for Storage {
        async fn get_documents_directory(&self) -> BridgeResult<PathBuf>;
        async fn exists(&self, path: &Path) -> BridgeResult<bool>;
        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
        async fn create_dir_all(&self, path: &Path) -> BridgeResult<()>;
        async fn read_file(&self, path: &Path) -> BridgeResult<Bytes>;
        async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()>;
        async fn delete_file(&self, path: &Path) -> BridgeResult<()>;
    }
}

/// Records requests; fails or hangs on demand.
#[derive(Default)]
struct RecordingExporter {
    requests: Mutex<Vec<ExportRequest>>,
    fail_with: Option<String>,
    hang: bool,
    protected: bool,
}

#[async_trait]
impl AssetExporter for RecordingExporter {
    async fn is_exportable(&self, _source_url: &str) -> bool {
        !self.protected
    }

    async fn export(&self, request: ExportRequest) -> BridgeResult<()> {
        self.requests.lock().push(request);
        if self.hang {
            std::future::pending::<()>().await;
        }
        match &self.fail_with {
            Some(message) => Err(BridgeError::OperationFailed(message.clone())),
            None => Ok(()),
        }
    }
}

const MEDIA_URL: &str = "https://cdn.example.com/media/bbb.mp4?token=abc";

#[tokio::test]
async fn test_export_writes_to_documents_under_remote_name() {
    let exporter = Arc::new(RecordingExporter::default());
    let fs = MemoryFileSystem::new();
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();

    let mut session = ExportSession::start(MEDIA_URL, exporter.clone(), fs, None, Some(bus))
        .await
        .unwrap();

    let expected = PathBuf::from(DOCS).join("bbb.mp4");
    assert_eq!(session.output_path(), expected.as_path());
    assert_eq!(session.wait().await.unwrap(), expected);

    let requests = exporter.requests.lock().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source_url, MEDIA_URL);
    assert_eq!(requests[0].output_path, expected);
    assert_eq!(requests[0].container, ContainerFormat::Mp4);

    assert!(matches!(
        events.recv().await.unwrap(),
        CoreEvent::Export(ExportEvent::Started { .. })
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        CoreEvent::Export(ExportEvent::Completed { .. })
    ));
}

#[tokio::test]
async fn test_stale_output_is_removed_before_export() {
    let exporter = Arc::new(RecordingExporter::default());
    let fs = MemoryFileSystem::new();
    let stale = PathBuf::from(DOCS).join("bbb.mp4");
    fs.insert(stale.clone(), b"old export");

    let mut session = ExportSession::start(MEDIA_URL, exporter, fs.clone(), None, None)
        .await
        .unwrap();
    session.wait().await.unwrap();

    assert!(fs.get(&stale).is_none());
}

#[tokio::test]
async fn test_failed_removal_does_not_block_export() {
    let mut storage = MockStorage::new();
    storage
        .expect_create_dir_all()
        .returning(|_| Ok(()));
    storage.expect_exists().returning(|_| Ok(true));
    storage
        .expect_delete_file()
        .times(1)
        .returning(|_| Err(BridgeError::OperationFailed("read-only volume".to_string())));

    let exporter = Arc::new(RecordingExporter::default());
    let mut session = ExportSession::start(
        MEDIA_URL,
        exporter.clone(),
        Arc::new(storage),
        Some(Path::new("/exports")),
        None,
    )
    .await
    .unwrap();

    assert_eq!(
        session.wait().await.unwrap(),
        PathBuf::from("/exports/bbb.mp4")
    );
    assert_eq!(exporter.requests.lock().len(), 1);
}

#[tokio::test]
async fn test_exporter_failure_is_reported() {
    let exporter = Arc::new(RecordingExporter {
        fail_with: Some("composition failed".to_string()),
        ..RecordingExporter::default()
    });
    let mut session = ExportSession::start(MEDIA_URL, exporter, MemoryFileSystem::new(), None, None)
        .await
        .unwrap();

    match session.wait().await {
        Err(PlaybackError::ExportFailed(message)) => assert!(message.contains("composition failed")),
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test]
async fn test_protected_asset_is_rejected() {
    let exporter = Arc::new(RecordingExporter {
        protected: true,
        ..RecordingExporter::default()
    });
    let result =
        ExportSession::start(MEDIA_URL, exporter.clone(), MemoryFileSystem::new(), None, None).await;

    assert!(matches!(result, Err(PlaybackError::ExportFailed(_))));
    assert!(exporter.requests.lock().is_empty());
}

#[tokio::test]
async fn test_url_without_file_name_is_rejected() {
    let exporter = Arc::new(RecordingExporter::default());
    let result = ExportSession::start(
        "https://cdn.example.com/",
        exporter,
        MemoryFileSystem::new(),
        None,
        None,
    )
    .await;

    assert!(matches!(result, Err(PlaybackError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_cancel_stops_running_export() {
    let exporter = Arc::new(RecordingExporter {
        hang: true,
        ..RecordingExporter::default()
    });
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let mut session =
        ExportSession::start(MEDIA_URL, exporter, MemoryFileSystem::new(), None, Some(bus))
            .await
            .unwrap();

    session.cancel();
    let result = tokio::time::timeout(Duration::from_secs(2), session.wait())
        .await
        .expect("cancelled export should finish");
    assert!(result.is_err());

    let mut cancelled = false;
    while let Ok(Ok(event)) = tokio::time::timeout(Duration::from_millis(200), events.recv()).await {
        if matches!(event, CoreEvent::Export(ExportEvent::Cancelled { .. })) {
            cancelled = true;
        }
    }
    assert!(cancelled);
}
