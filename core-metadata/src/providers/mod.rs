//! Remote catalog providers.
//!
//! Each provider owns its wire format and rate limiting and exposes itself
//! through [`CatalogSource`](crate::catalog::CatalogSource).

pub mod lastfm;

pub use lastfm::LastFmClient;
