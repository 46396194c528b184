//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop hosts
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` backed by a SQLite `settings` table
//! - `SettingsStore` kept in memory, for tests and throwaway sessions
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new("companion-settings.db".into()).await?;
//!     // hand both to CoreConfig::builder()
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

pub use http::ReqwestHttpClient;
pub use settings::{InMemorySettingsStore, SqliteSettingsStore};
