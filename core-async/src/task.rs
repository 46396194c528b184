//! Task spawning.
//!
//! Thin wrappers over `tokio::task`. Spawned futures must be `Send + 'static`
//! and may run on any worker thread.

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle};

/// Spawns a future onto the current Tokio runtime.
///
/// Must be called from within a runtime context.
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 7 });
/// assert_eq!(handle.await.ok(), Some(7));
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for joined tasks.
pub type Result<T> = std::result::Result<T, JoinError>;
