//! # Host Bridge Traits
//!
//! Capabilities the companion core needs from its host platform.
//!
//! The core never talks to the network or to preference storage directly.
//! Each host ships adapters for the traits below and injects them through
//! `core_runtime::config::CoreConfig`.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - async HTTP used by the remote catalog
//! - [`SettingsStore`](storage::SettingsStore) - durable key-value slots
//!   (library membership, recent searches)
//! - [`LoggerSink`](logging::LoggerSink) - forwards structured logs to the host
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//! | Mobile   | host-provided       |
//!
//! ## Error Handling
//!
//! All bridge traits return [`BridgeError`](error::BridgeError). Adapters
//! convert platform errors into it and keep the message actionable.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so adapters can be shared behind `Arc`
//! across async tasks.
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest};
//!
//! async fn ping(client: &dyn HttpClient) -> bridge_traits::error::Result<bool> {
//!     let response = client
//!         .execute(HttpRequest::get("https://ws.audioscrobbler.com/2.0/"))
//!         .await?;
//!     Ok(response.is_success())
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use logging::{LogEntry, LogLevel, LoggerSink};
pub use storage::SettingsStore;
