//! # Catalog Metadata
//!
//! Remote music catalog access for the companion core:
//! - [`CatalogSource`], the narrow interface the rest of the core depends on
//! - [`LastFmClient`], the Last.fm implementation (JSON over the injected
//!   [`HttpClient`](bridge_traits::http::HttpClient))
//! - [`ApiError`], the classified remote error taxonomy
//! - [`format`] helpers for durations, ranks and listener counts

pub mod catalog;
pub mod error;
pub mod format;
pub mod models;
pub mod providers;

pub use catalog::CatalogSource;
pub use error::{ApiError, Result};
pub use models::{Artist, ArtistPage};
pub use providers::LastFmClient;
