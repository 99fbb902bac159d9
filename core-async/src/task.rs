//! Task spawning and execution.
//!
//! Drivers for the cache and the player are spawned with [`spawn`]. Work that
//! must leave the actor's context (duration probing, persistence) is either
//! spawned as a separate task or pushed to the blocking pool with
//! [`spawn_blocking`], and its result is sent back to the actor as a message.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle, JoinSet};

/// Spawns a new asynchronous task on the Tokio runtime.
///
/// The spawned task may run on a different thread. The returned
/// [`JoinHandle`] detaches the task when dropped; call
/// [`JoinHandle::abort`] to cancel it.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
