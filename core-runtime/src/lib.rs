//! # Core Runtime Module
//!
//! Runtime infrastructure shared by every companion core crate:
//! - Logging and tracing setup ([`logging`])
//! - Configuration and bridge injection ([`config`])
//! - The typed event bus ([`events`])
//!
//! Nothing in here knows about albums or searches beyond the event payloads;
//! domain crates build on top of these pieces.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
