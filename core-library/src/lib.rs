//! # Library Sync Core
//!
//! Keeps a locally persisted set of saved albums and everyone who displays it
//! in agreement.
//!
//! ## Overview
//!
//! - [`store`]: transactional album store (SQLite) publishing change events
//! - [`mapper`]: typed conversion between [`Album`]/[`Track`] and store rows
//! - [`membership`]: durable "is this album saved" key set
//! - [`service`]: [`LibrarySyncService`], which ties the three together and
//!   fans store changes out to observers
//! - [`ordering`]: artist/name ordering for library views
//! - [`db`]: pool creation and embedded migrations
//!
//! ```rust,ignore
//! let pool = db::create_pool(DatabaseConfig::new(path)).await?;
//! let store = Arc::new(SqliteLibraryStore::new(pool, events.clone()));
//! let membership = Arc::new(MembershipCache::new(settings));
//! membership.load().await?;
//!
//! let library = LibrarySyncService::new(store, membership);
//! library.add_change_observer(|albums| render(albums))?;
//! library.save(album).await?;
//! ```

pub mod db;
pub mod error;
pub mod mapper;
pub mod membership;
pub mod models;
pub mod ordering;
pub mod service;
pub mod store;

pub use error::{LibraryError, Result};
pub use mapper::{AlbumMapper, RecordMapper, TrackMapper};
pub use membership::{MembershipCache, MEMBERSHIP_SLOT};
pub use models::{record_key, Album, AlbumRecord, Track, TrackRecord};
pub use ordering::library_order;
pub use service::{ChangeObserver, LibrarySyncService, ObserverId};
pub use store::{PersistentStore, SqliteLibraryStore, StoreRecord};
