//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-playback`). Host applications can
//! depend on `media-cache-workspace` and enable the documented features
//! without needing to wire each crate individually.
//!
//! - `desktop-shims` (default): the full service façade with desktop bridges
//! - `playback-only`: just the cache, player and export components

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "playback-only")]
pub use core_playback as playback;
