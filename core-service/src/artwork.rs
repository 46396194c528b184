//! Embedding artwork bytes into albums before they are saved.

use core_library::Album;
use core_metadata::CatalogSource;
use tracing::{debug, warn};

/// Download `album`'s artwork when its URL is known but the bytes are not.
///
/// A failed or empty download leaves the album without bytes.
pub(crate) async fn with_cached_image(catalog: &dyn CatalogSource, mut album: Album) -> Album {
    if album.image.is_some() {
        return album;
    }
    let Some(url) = album.image_url.clone() else {
        return album;
    };

    match catalog.fetch_image(&url).await {
        Ok(Some(bytes)) => {
            debug!(album_id = %album.id(), size = bytes.len(), "Cached album artwork");
            album.image = Some(bytes.to_vec());
        }
        Ok(None) => {
            debug!(album_id = %album.id(), "No artwork returned");
        }
        Err(e) => {
            warn!(album_id = %album.id(), error = %e, "Artwork download failed, saving without image");
        }
    }
    album
}
