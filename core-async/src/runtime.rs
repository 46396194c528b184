//! Runtime construction for callers that start outside async code.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs `future` to completion on a fresh current-thread runtime.
///
/// Intended for bootstrap paths (for example building a default settings
/// store) that are invoked from synchronous code. Must not be called from
/// inside another runtime's worker thread.
pub fn block_on<F>(future: F) -> std::io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}
