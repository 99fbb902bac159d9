//! Asset export bridge.
//!
//! Exporting re-muxes a remote asset into a local container file using the
//! host's media framework. The core only decides where the output goes and
//! when to start or cancel; the composition itself stays on the host side.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// Output container for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerFormat {
    #[default]
    Mp4,
    QuickTime,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::QuickTime => "mov",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "video/mp4",
            ContainerFormat::QuickTime => "video/quicktime",
        }
    }
}

/// Everything an exporter needs to produce one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Remote asset to read from.
    pub source_url: String,
    /// Destination file. Any previous file at this path has already been
    /// removed by the caller.
    pub output_path: PathBuf,
    pub container: ContainerFormat,
}

/// Host facility that exports an asset to a local file.
///
/// Dropping the returned future must cancel the export.
#[async_trait]
pub trait AssetExporter: Send + Sync {
    /// Whether the asset can be exported at all (protected content cannot).
    async fn is_exportable(&self, source_url: &str) -> bool {
        let _ = source_url;
        true
    }

    /// Run the export to completion.
    async fn export(&self, request: ExportRequest) -> Result<()>;
}
