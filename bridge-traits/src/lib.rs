//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement for the media
//! cache core.
//!
//! ## Overview
//!
//! The core never talks to the network, the disk, or a media engine directly.
//! It asks for these capabilities through the traits below, and the host (or
//! `bridge-desktop` on desktop targets) supplies concrete adapters.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Streaming HTTP GET feeding the cache
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Documents directory and
//!   file replacement for persisted copies
//!
//! ### Media
//! - [`MediaPipeline`](playback::MediaPipeline) - Opaque player the playback
//!   controller drives
//! - [`AssetExporter`](export::AssetExporter) - One-shot export of a remote
//!   asset into a local container file
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: enable the desktop-shims feature.".to_string(),
//!     })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared between
//! the caller, actor drivers and off-context tasks behind an `Arc`.

pub mod error;
pub mod export;
pub mod http;
pub mod logging;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

pub use export::{AssetExporter, ContainerFormat, ExportRequest};
pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpStream};
pub use playback::{MediaPipeline, PipelineStatus};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::FileSystemAccess;
