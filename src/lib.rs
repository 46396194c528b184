//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates. Host applications can depend on `companion-workspace` and
//! enable `desktop-shims` to get the [`core_service`] façade wired with the
//! desktop bridge defaults (reqwest HTTP client, SQLite settings store).

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
