//! An artist's top albums with saved badges.

use crate::error::Result;
use core_library::{Album, LibrarySyncService, ObserverId};
use core_metadata::CatalogSource;
use std::sync::Arc;
use tracing::debug;

/// An album row with its saved state at the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistAlbum {
    pub album: Album,
    pub is_saved: bool,
}

pub struct ArtistAlbums {
    artist: String,
    albums: Vec<Album>,
    library: Arc<LibrarySyncService>,
    observer: Option<ObserverId>,
}

impl ArtistAlbums {
    /// Fetch the artist's top albums from the catalog.
    pub async fn load(
        library: Arc<LibrarySyncService>,
        catalog: &dyn CatalogSource,
        artist: &str,
    ) -> Result<Self> {
        let albums = catalog.top_albums(artist).await?;
        debug!(artist, count = albums.len(), "Loaded top albums");

        Ok(Self {
            artist: artist.to_string(),
            albums,
            library,
            observer: None,
        })
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Albums in catalog order, each with its current saved flag.
    pub fn albums(&self) -> Vec<ArtistAlbum> {
        self.albums
            .iter()
            .map(|album| ArtistAlbum {
                is_saved: self.library.is_saved(album),
                album: album.clone(),
            })
            .collect()
    }

    pub fn album(&self, index: usize) -> Option<&Album> {
        self.albums.get(index)
    }

    /// Call `on_change` whenever the library changes so saved badges can be
    /// refreshed. Replaces any previously registered callback.
    pub fn watch<F>(&mut self, on_change: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.unwatch();
        let id = self.library.add_change_observer(move |_| on_change())?;
        self.observer = Some(id);
        Ok(())
    }

    pub fn unwatch(&mut self) {
        if let Some(id) = self.observer.take() {
            self.library.remove_change_observer(id);
        }
    }
}

impl Drop for ArtistAlbums {
    fn drop(&mut self) {
        self.unwatch();
    }
}
