//! Progressive-download cache.
//!
//! - [`request`]: read requests and the responder contract
//! - [`session`]: buffer and pending-read bookkeeping for one transfer
//! - [`cache`]: the actor that runs the transfer and services reads

pub mod cache;
pub mod request;
pub mod session;

pub use cache::{CacheDependencies, CacheDriver, CacheSnapshot, CompletionHandler, StreamingCache};
pub use request::{
    ByteRange, ContentInfo, LoadingRequest, ReadEvent, ReadHandle, ReadOutcome, ReadResponder,
    RequestId,
};
pub use session::{DownloadSession, SessionSnapshot, SessionState};
