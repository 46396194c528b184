//! Time-related helpers.
//!
//! Re-exports `tokio::time` so timers participate in Tokio's paused clock
//! during tests (`tokio::time::pause`).

pub use tokio::time::{interval, sleep, sleep_until, timeout, Interval, Sleep, Timeout};

pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Monotonic instant that follows Tokio's (possibly paused) clock.
pub use tokio::time::Instant;

/// Returns the current wall-clock time as milliseconds since `UNIX_EPOCH`.
///
/// A clock set before the epoch reports `0`.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
