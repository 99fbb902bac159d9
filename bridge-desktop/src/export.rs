//! Stream-copy exporter.
//!
//! Desktop builds have no platform media framework to re-mux with. When the
//! source already uses the requested container, exporting reduces to copying
//! the remote bytes into the output file, which this exporter does through
//! reqwest's body stream and `tokio::io::copy`.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    export::{AssetExporter, ExportRequest},
};
use futures_util::TryStreamExt;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

pub struct StreamCopyExporter {
    client: Client,
}

impl StreamCopyExporter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build an exporter with its own reqwest client.
    pub fn with_default_client() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("media-cache-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;
        Ok(Self::new(client))
    }

    /// Whether the URL's final path segment already carries the target
    /// container's extension.
    fn matches_container(source_url: &str, extension: &str) -> bool {
        let path = source_url
            .split(['?', '#'])
            .next()
            .unwrap_or(source_url);
        path.rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }
}

#[async_trait]
impl AssetExporter for StreamCopyExporter {
    async fn is_exportable(&self, source_url: &str) -> bool {
        source_url.starts_with("http://") || source_url.starts_with("https://")
    }

    async fn export(&self, request: ExportRequest) -> Result<()> {
        if !Self::matches_container(&request.source_url, request.container.extension()) {
            return Err(BridgeError::NotAvailable(format!(
                "re-muxing into {} is not supported on desktop",
                request.container.extension()
            )));
        }

        let response = self
            .client
            .get(&request.source_url)
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let mut reader = StreamReader::new(stream);

        if let Some(parent) = request.output_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::File::create(&request.output_path).await?;
        let copied = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        debug!(bytes = copied, "Copied export payload");
        info!(path = ?request.output_path, "Export written");
        Ok(())
    }
}
