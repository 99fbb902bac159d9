//! Download session state.
//!
//! `DownloadSession` owns the append-only buffer of one transfer and the set
//! of reads waiting on it. It performs no I/O: the cache driver feeds it
//! headers, chunks and the terminal outcome in delivery order, interleaved
//! with register/cancel commands, and every call services the pending reads
//! synchronously.

use crate::loader::request::{ContentInfo, LoadingRequest, RequestId};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Lifecycle of the transfer behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    NotStarted,
    HeadersReceived,
    Downloading,
    Completed,
    Failed,
}

impl SessionState {
    /// No more bytes will arrive.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

struct PendingRead {
    request: LoadingRequest,
    current_offset: u64,
    info_filled: bool,
}

impl PendingRead {
    fn new(request: LoadingRequest) -> Self {
        let current_offset = request.byte_range().map(|r| r.offset).unwrap_or(0);
        Self {
            request,
            current_offset,
            info_filled: false,
        }
    }

    fn fill_info(&mut self, info: &ContentInfo) {
        if self.request.wants_content_info() && !self.info_filled {
            self.request.responder().fill_content_info(info);
            self.info_filled = true;
        }
    }

    /// Emit the unread span that is already buffered.
    fn service(&mut self, buffer: &[u8]) {
        let Some(range) = self.request.byte_range() else {
            return;
        };
        let buffered = buffer.len() as u64;
        if self.current_offset >= buffered {
            return;
        }

        let unread_available = buffered - self.current_offset;
        let unread_requested = range.end() - self.current_offset;
        let count = unread_available.min(unread_requested);
        if count == 0 {
            return;
        }

        let start = self.current_offset as usize;
        let end = start + count as usize;
        self.request
            .responder()
            .respond(Bytes::copy_from_slice(&buffer[start..end]));
        self.current_offset += count;
    }

    fn is_satisfied(&self) -> bool {
        let info_done = !self.request.wants_content_info() || self.info_filled;
        let range_done = self
            .request
            .byte_range()
            .map_or(true, |range| self.current_offset >= range.end());
        info_done && range_done
    }

    fn finish(mut self) {
        self.request.responder().finish();
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub bytes_buffered: u64,
    pub expected_length: Option<u64>,
    pub content_type: Option<String>,
    pub pending_reads: usize,
}

/// One in-flight or completed transfer and the reads waiting on it.
#[derive(Default)]
pub struct DownloadSession {
    buffer: BytesMut,
    // Holds the payload once the transfer completes; `buffer` is empty then.
    completed: Bytes,
    content_info: Option<ContentInfo>,
    state: SessionState,
    pending: BTreeMap<RequestId, PendingRead>,
}

impl DownloadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn buffered(&self) -> &[u8] {
        match self.state {
            SessionState::Completed => &self.completed,
            _ => &self.buffer,
        }
    }

    pub fn content_info(&self) -> Option<&ContentInfo> {
        self.content_info.as_ref()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            bytes_buffered: self.buffered().len() as u64,
            expected_length: self
                .content_info
                .as_ref()
                .and_then(|info| info.content_length),
            content_type: self
                .content_info
                .as_ref()
                .and_then(|info| info.content_type.clone()),
            pending_reads: self.pending.len(),
        }
    }

    /// Register a read and service it against what is already buffered.
    ///
    /// A read that is satisfied immediately, or that arrives after the
    /// transfer ended, is finished without being stored.
    pub fn register(&mut self, request: LoadingRequest) {
        let id = request.id();
        let mut read = PendingRead::new(request);

        if let Some(info) = &self.content_info {
            read.fill_info(info);
        }
        read.service(self.buffered());

        if read.is_satisfied() || self.state.is_terminal() {
            trace!(read = %id, "Read finished at registration");
            read.finish();
        } else {
            self.pending.insert(id, read);
        }
    }

    /// Drop a pending read without finishing it. Returns whether it was known.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Record response metadata. Only the first call has any effect.
    pub fn on_headers(&mut self, info: ContentInfo) -> bool {
        if self.content_info.is_some() || self.state.is_terminal() {
            return false;
        }

        for read in self.pending.values_mut() {
            read.fill_info(&info);
        }
        self.content_info = Some(info);
        self.state = SessionState::HeadersReceived;
        self.finish_satisfied();
        true
    }

    /// Append a chunk and service every pending read.
    pub fn on_chunk(&mut self, chunk: &[u8]) {
        if self.state.is_terminal() || chunk.is_empty() {
            return;
        }

        self.buffer.extend_from_slice(chunk);
        self.state = SessionState::Downloading;

        for read in self.pending.values_mut() {
            read.service(&self.buffer);
        }
        self.finish_satisfied();
    }

    /// Mark the transfer complete and finish every remaining read.
    ///
    /// Returns the full payload for persistence. The buffer is frozen in
    /// place, so later reads are still served from it.
    pub fn complete(&mut self) -> Bytes {
        if self.state != SessionState::Completed {
            self.finish_all();
            self.state = SessionState::Completed;
            self.completed = std::mem::take(&mut self.buffer).freeze();
        }
        self.completed.clone()
    }

    /// Mark the transfer failed and finish every remaining read with the data
    /// it already received. Returns the number of reads cut short.
    pub fn fail(&mut self) -> usize {
        if !self.state.is_terminal() {
            self.state = SessionState::Failed;
        }
        self.finish_all()
    }

    fn finish_satisfied(&mut self) {
        let done: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|(_, read)| read.is_satisfied())
            .map(|(id, _)| *id)
            .collect();

        for id in done {
            if let Some(read) = self.pending.remove(&id) {
                read.finish();
            }
        }
    }

    fn finish_all(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (_, mut read) in pending {
            read.service(self.buffered());
            read.finish();
        }
        count
    }
}
