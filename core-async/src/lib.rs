//! Async runtime facade for the companion core.
//!
//! Every core crate reaches the executor through this crate instead of naming
//! Tokio directly, so the runtime choice lives in one place.
//!
//! # Modules
//!
//! - `task`: task spawning and join handles
//! - `time`: sleeping, deadlines and timeouts
//! - `sync`: async locks and channels
//! - `runtime`: building runtimes and blocking on futures from sync code
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.ok(), Some(42));
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
