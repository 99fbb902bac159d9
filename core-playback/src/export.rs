//! # Asset Export
//!
//! Exports a remote asset into `<documents>/<last path segment>` through the
//! host's [`AssetExporter`]. Any file already at that path is removed first.
//!
//! The export runs on its own task; the [`ExportSession`] can be awaited,
//! cancelled, or dropped (which cancels).

use crate::error::{PlaybackError, Result};
use crate::location;
use bridge_traits::{AssetExporter, ContainerFormat, ExportRequest, FileSystemAccess};
use core_async::sync::{oneshot, CancellationToken};
use core_runtime::events::{CoreEvent, EventBus, ExportEvent};
use core_runtime::logging::{redact_url, strip_path};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// A running (or finished) export.
#[derive(Debug)]
pub struct ExportSession {
    id: String,
    output_path: PathBuf,
    cancel: CancellationToken,
    result: Option<oneshot::Receiver<Result<PathBuf>>>,
}

impl ExportSession {
    /// Resolve the output path, clear it, and start the export.
    pub async fn start(
        remote_url: &str,
        exporter: Arc<dyn AssetExporter>,
        file_system: Arc<dyn FileSystemAccess>,
        documents_dir: Option<&Path>,
        event_bus: Option<EventBus>,
    ) -> Result<Self> {
        let remote = location::parse_remote(remote_url)?;
        let name = location::local_file_name(&remote).ok_or_else(|| {
            PlaybackError::InvalidUrl(format!(
                "{} has no file name",
                redact_url(remote.as_str())
            ))
        })?;

        if !exporter.is_exportable(remote.as_str()).await {
            return Err(PlaybackError::ExportFailed(format!(
                "{} is not exportable",
                redact_url(remote.as_str())
            )));
        }

        let dir = location::documents_dir(file_system.as_ref(), documents_dir)
            .await
            .map_err(|e| PlaybackError::ExportFailed(e.to_string()))?;
        let output_path = dir.join(name);

        if file_system.exists(&output_path).await.unwrap_or(false) {
            if let Err(err) = file_system.delete_file(&output_path).await {
                warn!(error = %err, "Could not remove previous export");
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();

        let request = ExportRequest {
            source_url: remote.to_string(),
            output_path: output_path.clone(),
            container: ContainerFormat::Mp4,
        };
        let span = tracing::info_span!("asset_export", export = %id);
        core_async::spawn(
            run_export(id.clone(), exporter, request, cancel.clone(), event_bus, tx)
                .instrument(span),
        );

        Ok(Self {
            id,
            output_path,
            cancel,
            result: Some(rx),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Stop a running export. No-op once it has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the export to finish and return the written file.
    pub async fn wait(&mut self) -> Result<PathBuf> {
        let rx = self
            .result
            .take()
            .ok_or_else(|| PlaybackError::Internal("export result already taken".to_string()))?;
        rx.await
            .map_err(|_| PlaybackError::ExportFailed("export task ended without a result".to_string()))?
    }
}

impl Drop for ExportSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_export(
    id: String,
    exporter: Arc<dyn AssetExporter>,
    request: ExportRequest,
    cancel: CancellationToken,
    event_bus: Option<EventBus>,
    result: oneshot::Sender<Result<PathBuf>>,
) {
    let emit = |event: ExportEvent| {
        if let Some(bus) = &event_bus {
            let _ = bus.emit(CoreEvent::Export(event));
        }
    };

    let output_path = request.output_path.clone();
    let shown = output_path.to_string_lossy().into_owned();
    info!(file = %strip_path(&shown), container = request.container.extension(), "Export started");
    emit(ExportEvent::Started {
        export_id: id.clone(),
        output_path: shown.clone(),
    });

    let finished = core_async::select! {
        _ = cancel.cancelled() => None,
        finished = exporter.export(request) => Some(finished),
    };

    let outcome = match finished {
        None => {
            debug!("Export cancelled");
            emit(ExportEvent::Cancelled { export_id: id });
            Err(PlaybackError::ExportFailed("cancelled".to_string()))
        }
        Some(Ok(())) => {
            info!(file = %strip_path(&shown), "Export completed");
            emit(ExportEvent::Completed {
                export_id: id,
                output_path: shown,
            });
            Ok(output_path)
        }
        Some(Err(err)) => {
            warn!(error = %err, "Export failed");
            emit(ExportEvent::Failed {
                export_id: id,
                message: err.to_string(),
            });
            Err(PlaybackError::ExportFailed(err.to_string()))
        }
    };

    let _ = result.send(outcome);
}
