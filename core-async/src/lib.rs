//! Async runtime facade for the media cache workspace.
//!
//! Every `core-*` crate reaches the executor through this crate instead of
//! depending on Tokio directly. The streaming cache and the playback
//! controller are both actors: a handle sends commands over a channel to a
//! driver future that owns all mutable state. This crate supplies the pieces
//! those actors are built from.
//!
//! # Modules
//!
//! - `task`: spawning drivers and off-context work
//! - `time`: sleeps, intervals and timeouts for samplers and transfers
//! - `sync`: channels, cancellation and locks
//! - `runtime`: blocking entry points for hosts without an executor
//!
//! Drivers multiplex their inputs with the re-exported [`select!`] macro.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::mpsc;
//! use core_async::task;
//!
//! async fn example() {
//!     let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
//!     let driver = task::spawn(async move {
//!         let mut total = 0;
//!         while let Some(value) = rx.recv().await {
//!             total += value;
//!         }
//!         total
//!     });
//!     tx.send(2).unwrap();
//!     drop(tx);
//!     assert_eq!(driver.await.unwrap(), 2);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use tokio::select;
pub use time::{sleep, Duration, Instant};
