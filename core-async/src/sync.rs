//! Synchronization primitives.
//!
//! Actors in this workspace communicate exclusively through these types:
//!
//! - `mpsc::unbounded_channel` carries commands into a driver; sends never
//!   block, so operations like registering a read return immediately.
//! - `oneshot` carries replies and seek completions back out.
//! - `watch` publishes the latest snapshot of an actor's state and the
//!   readiness status of a media pipeline.
//! - `broadcast` backs the runtime event bus.
//! - [`CancellationToken`] stops a network transfer on invalidation.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{watch, CancellationToken};
//!
//! let (tx, rx) = watch::channel(0u64);
//! tx.send(512).unwrap();
//! assert_eq!(*rx.borrow(), 512);
//!
//! let token = CancellationToken::new();
//! let child = token.child_token();
//! token.cancel();
//! assert!(child.is_cancelled());
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Semaphore, SemaphorePermit,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
