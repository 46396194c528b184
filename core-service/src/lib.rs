//! Core service façade and bootstrap helpers.
//!
//! [`CoreService::bootstrap`] turns a validated [`CoreConfig`] into the wired
//! core: the SQLite library store and its sync service, the Last.fm catalog
//! client, and the artist search session, all sharing one [`EventBus`].
//! Desktop hosts enable the `desktop-shims` feature so the config builder
//! fills in the reqwest HTTP client and SQLite settings store.

pub mod album_detail;
pub mod artist_albums;
mod artwork;
pub mod error;

pub use album_detail::AlbumDetail;
pub use artist_albums::{ArtistAlbum, ArtistAlbums};
pub use error::{CoreError, Result};

pub use bridge_traits::{http::HttpClient, storage::SettingsStore};
pub use core_library::{Album, ObserverId, Track};
pub use core_metadata::{format, ApiError, Artist};
pub use core_runtime::config::{CoreConfig, LastFmConfig, SearchConfig};
pub use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, SearchEvent};
pub use core_search::{ResultKind, SearchUpdate};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};

use core_async::sync::mpsc::UnboundedReceiver;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::{library_order, LibrarySyncService, MembershipCache, SqliteLibraryStore};
use core_metadata::{CatalogSource, LastFmClient};
use core_search::{DebouncedSearch, RecentQueries, SearchSession};
use std::sync::Arc;
use tracing::{info, warn};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    events: EventBus,
    library: Arc<LibrarySyncService>,
    catalog: Arc<dyn CatalogSource>,
    search: Arc<SearchSession>,
    search_config: SearchConfig,
}

impl CoreService {
    /// Build every component from `config`.
    ///
    /// Membership and recent searches are restored from the settings store,
    /// then membership is reconciled with the library database.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        info!(database = %config.database_path.display(), "Bootstrapping companion core");

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CoreError::InitializationFailed(format!(
                        "cannot create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let events = EventBus::new(config.event_buffer_size);

        let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;
        let store = Arc::new(SqliteLibraryStore::new(pool, events.clone()));

        let membership = Arc::new(MembershipCache::new(Arc::clone(&config.settings_store)));
        membership.load().await?;
        let library = Arc::new(LibrarySyncService::new(store, membership));

        let catalog: Arc<dyn CatalogSource> = Arc::new(LastFmClient::from_config(
            Arc::clone(&config.http_client),
            &config.lastfm,
        )?);

        let recent = Arc::new(RecentQueries::new(
            Arc::clone(&config.settings_store),
            config.search.recent_capacity,
        ));
        recent.load().await?;

        let search = Arc::new(
            SearchSession::new(Arc::clone(&catalog), recent)
                .with_page_limit(config.search.page_limit)
                .with_events(events.clone()),
        );

        if let Err(e) = library.list().await {
            warn!(error = %e, "Could not reconcile library membership at startup");
        }

        info!("Companion core ready");
        Ok(Self {
            events,
            library,
            catalog,
            search,
            search_config: config.search,
        })
    }

    /// Assemble a service from already constructed parts.
    pub fn from_parts(
        events: EventBus,
        library: Arc<LibrarySyncService>,
        catalog: Arc<dyn CatalogSource>,
        search: Arc<SearchSession>,
        search_config: SearchConfig,
    ) -> Self {
        Self {
            events,
            library,
            catalog,
            search,
            search_config,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn library(&self) -> &Arc<LibrarySyncService> {
        &self.library
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogSource> {
        &self.catalog
    }

    pub fn search(&self) -> &Arc<SearchSession> {
        &self.search
    }

    /// Saved albums grouped by artist, then by name.
    pub async fn library_albums(&self) -> Result<Vec<Album>> {
        Ok(library_order(self.library.list().await?))
    }

    /// Receive the ordered library after every change.
    pub fn observe_library<F>(&self, observer: F) -> Result<ObserverId>
    where
        F: Fn(&[Album]) + Send + Sync + 'static,
    {
        let id = self.library.add_change_observer(move |albums| {
            let ordered = library_order(albums.to_vec());
            observer(&ordered);
        })?;
        Ok(id)
    }

    pub fn stop_observing_library(&self, id: ObserverId) -> bool {
        self.library.remove_change_observer(id)
    }

    pub fn open_saved_album(&self, album: Album) -> AlbumDetail {
        AlbumDetail::from_saved(Arc::clone(&self.library), Arc::clone(&self.catalog), album)
    }

    pub async fn open_remote_album(&self, top_album: &Album) -> Result<AlbumDetail> {
        AlbumDetail::from_remote(Arc::clone(&self.library), Arc::clone(&self.catalog), top_album)
            .await
    }

    pub async fn artist_albums(&self, artist: &str) -> Result<ArtistAlbums> {
        ArtistAlbums::load(Arc::clone(&self.library), self.catalog.as_ref(), artist).await
    }

    /// Drive the search session from raw text input, debounced by the
    /// configured quiet period.
    pub fn debounced_search(&self) -> (DebouncedSearch, UnboundedReceiver<SearchUpdate>) {
        DebouncedSearch::spawn(Arc::clone(&self.search), self.search_config.debounce())
    }
}

#[cfg(feature = "desktop-shims")]
/// Bootstrap with desktop bridges and defaults for everything but the
/// database location and catalog settings.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, LastFmConfig};
///
/// let core = bootstrap_desktop("/tmp/companion/library.db", LastFmConfig::from_env()).await?;
/// let albums = core.library_albums().await?;
/// # Ok(())
/// # }
/// ```
pub async fn bootstrap_desktop(
    database_path: impl Into<std::path::PathBuf>,
    lastfm: LastFmConfig,
) -> Result<CoreService> {
    let config = CoreConfig::builder()
        .database_path(database_path)
        .lastfm(lastfm)
        .build()?;
    CoreService::bootstrap(config).await
}
