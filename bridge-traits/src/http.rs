//! HTTP Client Abstraction
//!
//! The streaming cache issues exactly one GET per session and consumes the
//! response as an ordered stream of chunks. No retries or redirects are
//! handled at this layer; a failed transfer is reported once.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Ordered body chunks of a streaming response, ending after the last chunk
/// or after the first error.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

fn header_lookup<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Fully buffered HTTP response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Get response body as UTF-8 string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }
}

/// Response whose body has not been read yet.
///
/// Status and headers are available as soon as the server answers; the body
/// arrives through [`HttpStream::body`] in delivery order.
pub struct HttpStream {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: ByteStream,
}

impl HttpStream {
    pub fn new(status: u16, headers: HashMap<String, String>, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    /// Media type from `Content-Type`, without parameters.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type")
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Expected body length from `Content-Length`.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|value| value.trim().parse().ok())
    }

    /// Drain the body into a single buffer.
    pub async fn collect(self) -> Result<HttpResponse> {
        let HttpStream {
            status,
            headers,
            mut body,
        } = self;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(HttpResponse {
            status,
            headers,
            body: buffer.freeze(),
        })
    }
}

impl fmt::Debug for HttpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Async HTTP client trait
///
/// Implementations must deliver body chunks in order and end the stream after
/// the first transport error.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn fetch(client: &dyn HttpClient) -> Result<usize> {
///     let response = client.stream(HttpRequest::get("https://cdn.example.com/a.mp4")).await?;
///     let full = response.collect().await?;
///     Ok(full.body.len())
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and return as soon as response headers arrive.
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails or the request times out before
    /// headers are received. Non-2xx statuses are not errors here.
    async fn stream(&self, request: HttpRequest) -> Result<HttpStream>;

    /// Send a request and buffer the whole body.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.stream(request).await?.collect().await
    }
}
