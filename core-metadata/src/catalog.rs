//! The remote catalog as seen by the rest of the core.

use crate::error::Result;
use crate::models::ArtistPage;
use async_trait::async_trait;
use bytes::Bytes;
use core_library::Album;

/// Read-only access to the music metadata catalog.
///
/// Implementations never retry; a failed call is reported once and the
/// caller decides what to do.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Search artists by name. `page` is 1-based.
    async fn search_artists(&self, text: &str, page: u32, limit: u32) -> Result<ArtistPage>;

    /// Full album detail, tracks and description included.
    async fn album_detail(&self, name: &str, artist: &str) -> Result<Album>;

    /// The artist's most popular albums, without tracks.
    async fn top_albums(&self, artist: &str) -> Result<Vec<Album>>;

    /// Download artwork. `Ok(None)` when the server has nothing to return.
    async fn fetch_image(&self, url: &str) -> Result<Option<Bytes>>;
}
