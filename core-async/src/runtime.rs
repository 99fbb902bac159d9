//! Runtime utilities that abstract over the underlying async executor.
//!
//! Hosts that already run Tokio never touch this module. Hosts that call into
//! the core from synchronous code (a CLI, a test harness, an FFI shim) use
//! [`block_on`] or build their own runtime through the re-exported builder.

use std::io;

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// Fails only if the runtime itself cannot be built (for example when the
/// process is out of file descriptors for the IO driver).
pub fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

/// Returns a handle to the runtime driving the current task, if any.
///
/// Actor constructors use this to decide whether they can spawn their driver
/// or must hand it back to the caller.
pub fn current() -> Option<Handle> {
    Handle::try_current().ok()
}
