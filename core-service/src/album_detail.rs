//! Album detail screen state.

use crate::artwork::with_cached_image;
use crate::error::Result;
use core_library::{Album, LibrarySyncService};
use core_metadata::CatalogSource;
use std::sync::Arc;
use tracing::debug;

/// One album being viewed, with save/remove toggling.
pub struct AlbumDetail {
    library: Arc<LibrarySyncService>,
    catalog: Arc<dyn CatalogSource>,
    album: Album,
}

impl AlbumDetail {
    /// Open an album already held locally. No network access.
    pub fn from_saved(
        library: Arc<LibrarySyncService>,
        catalog: Arc<dyn CatalogSource>,
        album: Album,
    ) -> Self {
        Self {
            library,
            catalog,
            album,
        }
    }

    /// Open a top album by fetching its full detail from the catalog.
    pub async fn from_remote(
        library: Arc<LibrarySyncService>,
        catalog: Arc<dyn CatalogSource>,
        top_album: &Album,
    ) -> Result<Self> {
        let album = catalog
            .album_detail(&top_album.name, &top_album.artist)
            .await?;

        Ok(Self {
            library,
            catalog,
            album,
        })
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn is_saved(&self) -> bool {
        self.library.is_saved(&self.album)
    }

    /// Remove the album if saved, save it otherwise. Returns the new state.
    pub async fn toggle_saved(&mut self) -> Result<bool> {
        if self.is_saved() {
            self.library.remove(self.album.clone()).await?;
            debug!(album_id = %self.album.id(), "Album unsaved");
            return Ok(false);
        }

        let album = with_cached_image(self.catalog.as_ref(), self.album.clone()).await;
        self.album = self.library.save(album).await?;
        debug!(album_id = %self.album.id(), "Album saved");
        Ok(true)
    }

    /// `(title, description)` when the album has a description.
    pub fn info(&self) -> Option<(String, String)> {
        self.album
            .description
            .as_ref()
            .map(|description| (self.album.name.clone(), description.clone()))
    }
}
