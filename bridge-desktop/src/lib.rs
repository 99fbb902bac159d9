//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with streamed bodies
//! - `FileSystemAccess` using `tokio::fs` and the platform documents directory
//! - `AssetExporter` that copies same-container sources byte for byte
//!
//! Pipelines are not provided here: a desktop host plugs its own player into
//! `bridge_traits::MediaPipeline`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let fs = TokioFileSystem::new();
//!     // Hand both to CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod export;
mod filesystem;
mod http;

pub use export::StreamCopyExporter;
pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
