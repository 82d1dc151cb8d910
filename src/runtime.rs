//! Tokio runtime lifecycle for the bridge binary.
//!
//! Reads from stdin and regular files sit on tokio's blocking pool, and a
//! parked blocking read cannot be cancelled. Dropping the runtime would wait
//! for that read to return, so the runtime is shut down with a bounded grace
//! period instead.

use std::future::Future;
use std::time::Duration;

use crate::AppError;

/// How long shutdown waits for blocking-pool threads before leaving them behind.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run `future` to completion on a fresh multi-threaded runtime, then shut
/// the runtime down without waiting on parked blocking reads.
pub fn run<F>(future: F) -> Result<F::Output, AppError>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Startup)?;

    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    Ok(output)
}
