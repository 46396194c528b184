//! Synchronization primitives.
//!
//! Async-aware locks and channels backed by `tokio::sync`. All types are
//! `Send + Sync` and never block the executor while waiting.
//!
//! Guards from these locks may be held across `.await`; the std locks may not.
//! Core crates prefer the std locks for short critical sections and reach for
//! these only when the guarded section itself must await.

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};
