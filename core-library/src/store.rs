//! # Persistent Store
//!
//! A transactional store keyed by record identity. Every mutation commits as a
//! single transaction and, once committed, publishes a [`LibraryEvent`] on the
//! shared [`EventBus`]. The store never calls observers itself; consumers
//! subscribe to its event stream.

use crate::error::{LibraryError, Result};
use crate::models::{AlbumRecord, TrackRecord};
use async_trait::async_trait;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Receiver};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, info};

/// A record shape the store knows how to key.
pub trait StoreRecord: Send + Sync + 'static {
    /// Entity name used in error reports.
    const ENTITY: &'static str;

    fn key(&self) -> &str;
}

impl StoreRecord for AlbumRecord {
    const ENTITY: &'static str = "Album";

    fn key(&self) -> &str {
        &self.id
    }
}

/// Generic store of records of type `R`.
#[async_trait]
pub trait PersistentStore<R: StoreRecord>: Send + Sync {
    /// All records of this type, in store order.
    async fn fetch_all(&self) -> Result<Vec<R>>;

    /// Insert a new record. A duplicate key fails with `AlreadyExists`.
    async fn save(&self, record: &R) -> Result<()>;

    /// Delete the record with exactly this key. A missing key fails with `NotFound`.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Change events published after each successful commit.
    fn subscribe(&self) -> Receiver<CoreEvent>;
}

/// SQLite-backed album store.
pub struct SqliteLibraryStore {
    pool: SqlitePool,
    events: EventBus,
}

impl SqliteLibraryStore {
    pub fn new(pool: SqlitePool, events: EventBus) -> Self {
        Self { pool, events }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn publish(&self, event: LibraryEvent) {
        // No subscribers is not an error for the store.
        let _ = self.events.emit(CoreEvent::Library(event));
    }
}

fn map_insert_error(err: sqlx::Error, id: &str) -> LibraryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => LibraryError::AlreadyExists {
            entity_type: AlbumRecord::ENTITY.to_string(),
            id: id.to_string(),
        },
        _ => LibraryError::Database(err),
    }
}

#[async_trait]
impl PersistentStore<AlbumRecord> for SqliteLibraryStore {
    async fn fetch_all(&self) -> Result<Vec<AlbumRecord>> {
        let mut tx = self.pool.begin().await?;

        let mut albums: Vec<AlbumRecord> = sqlx::query_as(
            "SELECT id, name, artist, info, image, image_url FROM albums ORDER BY rowid",
        )
        .fetch_all(&mut *tx)
        .await?;

        let tracks: Vec<TrackRecord> = sqlx::query_as(
            "SELECT album_id, id, name, duration, rank, artist FROM tracks ORDER BY row_id",
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_album: HashMap<String, Vec<TrackRecord>> = HashMap::new();
        for track in tracks {
            by_album.entry(track.album_id.clone()).or_default().push(track);
        }
        for album in &mut albums {
            album.tracks = by_album.remove(&album.id).unwrap_or_default();
        }

        debug!(count = albums.len(), "Fetched albums");
        Ok(albums)
    }

    async fn save(&self, record: &AlbumRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO albums (id, name, artist, info, image, image_url)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.artist)
        .bind(&record.info)
        .bind(&record.image)
        .bind(&record.image_url)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &record.id))?;

        for track in &record.tracks {
            sqlx::query(
                r#"
                INSERT INTO tracks (album_id, id, name, duration, rank, artist)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record.id)
            .bind(&track.id)
            .bind(&track.name)
            .bind(track.duration)
            .bind(&track.rank)
            .bind(&track.artist)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(album_id = %record.id, tracks = record.tracks.len(), "Album saved");
        self.publish(LibraryEvent::AlbumSaved {
            album_id: record.id.clone(),
            name: record.name.clone().unwrap_or_default(),
            artist: record.artist.clone().unwrap_or_default(),
        });
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM albums WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_none() {
            return Err(LibraryError::NotFound {
                entity_type: AlbumRecord::ENTITY.to_string(),
                id: id.to_string(),
            });
        }

        sqlx::query("DELETE FROM tracks WHERE album_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM albums WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(album_id = %id, "Album removed");
        self.publish(LibraryEvent::AlbumRemoved {
            album_id: id.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }
}
