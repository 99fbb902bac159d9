//! Time-related abstractions.
//!
//! The progress sampler ticks on an [`Interval`] that is rebuilt every time
//! playback starts; [`fresh_interval`] builds one whose first tick is one full
//! period away and which skips missed ticks instead of bursting.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{fresh_interval, Duration};
//!
//! async fn example() {
//!     let mut ticker = fresh_interval(Duration::from_millis(100));
//!     ticker.tick().await; // ~100ms later
//! }
//! ```

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
pub use tokio::time::{
    interval, interval_at, sleep, sleep_until, timeout, Interval, MissedTickBehavior, Sleep,
    Timeout,
};

/// Errors produced by [`timeout`].
pub use tokio::time::error::Elapsed;

/// Creates an interval whose first tick fires one `period` from now.
///
/// `tokio::time::interval` completes its first tick immediately, which would
/// publish a sample the instant playback starts. Missed ticks are skipped.
pub fn fresh_interval(period: Duration) -> Interval {
    let start = tokio::time::Instant::now() + period;
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Returns the current time as milliseconds since UNIX_EPOCH.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
