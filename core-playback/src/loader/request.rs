//! Read requests issued by the media pipeline.
//!
//! A [`LoadingRequest`] asks for a byte range, for content information, or
//! both. The cache answers through the request's [`ReadResponder`]; hosts
//! that bridge a platform loader implement the trait directly, everything
//! else (including tests) can use the channel pair from
//! [`LoadingRequest::channel`].

use bytes::{Bytes, BytesMut};
use core_async::sync::mpsc;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a read for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read-{}", self.0)
    }
}

/// Byte range requested by a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}

/// Content information reported from the response headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentInfo {
    /// MIME type without parameters.
    pub content_type: Option<String>,
    /// Expected total length in bytes.
    pub content_length: Option<u64>,
    /// The cache can serve arbitrary ranges once the bytes have arrived.
    pub byte_range_access: bool,
}

/// Receiver side of a read.
///
/// Calls arrive in order: at most one `fill_content_info`, any number of
/// `respond` calls with consecutive spans, then exactly one `finish`.
pub trait ReadResponder: Send {
    fn fill_content_info(&mut self, info: &ContentInfo);

    /// Deliver the next span of the requested range.
    fn respond(&mut self, data: Bytes);

    /// No more data will be delivered. A short total means end of resource.
    fn finish(&mut self);
}

/// A read registered with the streaming cache.
pub struct LoadingRequest {
    id: RequestId,
    wants_content_info: bool,
    range: Option<ByteRange>,
    responder: Box<dyn ReadResponder>,
}

impl LoadingRequest {
    pub fn new(
        wants_content_info: bool,
        range: Option<ByteRange>,
        responder: Box<dyn ReadResponder>,
    ) -> Self {
        Self {
            id: RequestId::next(),
            wants_content_info,
            range,
            responder,
        }
    }

    /// Build a request answered through an in-process channel.
    pub fn channel(wants_content_info: bool, range: Option<ByteRange>) -> (Self, ReadHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let request = Self::new(wants_content_info, range, Box::new(ChannelResponder { tx }));
        let handle = ReadHandle { id: request.id, rx };
        (request, handle)
    }

    /// Data-only read of `length` bytes starting at `offset`.
    pub fn range(offset: u64, length: u64) -> (Self, ReadHandle) {
        Self::channel(false, Some(ByteRange::new(offset, length)))
    }

    /// Content-information-only read.
    pub fn content_info() -> (Self, ReadHandle) {
        Self::channel(true, None)
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn wants_content_info(&self) -> bool {
        self.wants_content_info
    }

    pub fn byte_range(&self) -> Option<ByteRange> {
        self.range
    }

    pub(crate) fn responder(&mut self) -> &mut dyn ReadResponder {
        self.responder.as_mut()
    }
}

impl fmt::Debug for LoadingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingRequest")
            .field("id", &self.id)
            .field("wants_content_info", &self.wants_content_info)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Event delivered to a channel-backed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    ContentInfo(ContentInfo),
    Data(Bytes),
    Finished,
}

struct ChannelResponder {
    tx: mpsc::UnboundedSender<ReadEvent>,
}

impl ReadResponder for ChannelResponder {
    fn fill_content_info(&mut self, info: &ContentInfo) {
        let _ = self.tx.send(ReadEvent::ContentInfo(info.clone()));
    }

    fn respond(&mut self, data: Bytes) {
        let _ = self.tx.send(ReadEvent::Data(data));
    }

    fn finish(&mut self) {
        let _ = self.tx.send(ReadEvent::Finished);
    }
}

/// Everything a channel-backed read received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    pub content_info: Option<ContentInfo>,
    pub data: Bytes,
    /// Number of `respond` calls, i.e. servicing passes that delivered data.
    pub chunks: usize,
    /// `finish` was called (false if the cache went away first).
    pub finished: bool,
}

/// Pipeline side of a channel-backed read.
#[derive(Debug)]
pub struct ReadHandle {
    id: RequestId,
    rx: mpsc::UnboundedReceiver<ReadEvent>,
}

impl ReadHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Next event, `None` once the responder is gone.
    pub async fn recv(&mut self) -> Option<ReadEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ReadEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain events until the read is finished.
    pub async fn collect(mut self) -> ReadOutcome {
        let mut outcome = ReadOutcome::default();
        let mut data = BytesMut::new();

        while let Some(event) = self.rx.recv().await {
            match event {
                ReadEvent::ContentInfo(info) => outcome.content_info = Some(info),
                ReadEvent::Data(chunk) => {
                    outcome.chunks += 1;
                    data.extend_from_slice(&chunk);
                }
                ReadEvent::Finished => {
                    outcome.finished = true;
                    break;
                }
            }
        }

        outcome.data = data.freeze();
        outcome
    }
}
