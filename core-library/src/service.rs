//! # Library Sync Service
//!
//! Orchestrates saving, listing and removing albums through the
//! [`PersistentStore`], keeps the [`MembershipCache`] in step with it and fans
//! store changes out to registered observers.
//!
//! ## Change fan-out
//!
//! The store's event stream is the only trigger. The first call to
//! [`LibrarySyncService::add_change_observer`] subscribes to the store and
//! spawns a listener task; on every committed change the listener reloads the
//! full album list once and hands the same slice to each observer. Observers
//! run on the listener task without any registry lock held, so an observer may
//! itself save or remove albums.
//!
//! Because the trigger is the store, mutations made through another service
//! sharing the same store (and event bus) reach these observers too.
//!
//! A reload and its membership replacement never interleave with a save or
//! remove on the same service, so membership read right after a mutation
//! returns reflects that mutation.

use crate::error::{LibraryError, Result};
use crate::mapper::{AlbumMapper, RecordMapper};
use crate::membership::MembershipCache;
use crate::models::{Album, AlbumRecord};
use crate::store::PersistentStore;
use core_async::runtime::Handle;
use core_async::sync::Mutex as AsyncMutex;
use core_async::task::JoinHandle;
use core_runtime::events::{CoreEvent, EventStream, RecvError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, warn};

/// Callback receiving the fresh album list after each store change.
pub type ChangeObserver = Arc<dyn Fn(&[Album]) + Send + Sync>;

/// Handle returned by [`LibrarySyncService::add_change_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Inner {
    store: Arc<dyn PersistentStore<AlbumRecord>>,
    membership: Arc<MembershipCache>,
    observers: Mutex<Vec<(ObserverId, ChangeObserver)>>,
    next_id: AtomicU64,
    /// Held across a store write plus its membership update, and across a
    /// reload plus its membership replacement.
    sync: AsyncMutex<()>,
}

pub struct LibrarySyncService {
    inner: Arc<Inner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl LibrarySyncService {
    pub fn new(
        store: Arc<dyn PersistentStore<AlbumRecord>>,
        membership: Arc<MembershipCache>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                membership,
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                sync: AsyncMutex::new(()),
            }),
            listener: Mutex::new(None),
        }
    }

    pub fn membership(&self) -> &Arc<MembershipCache> {
        &self.inner.membership
    }

    /// All saved albums in store order.
    ///
    /// Membership is replaced with the keys of every stored record. Any
    /// store failure is reported as [`LibraryError::FetchFailed`] and no
    /// partial list is returned.
    pub async fn list(&self) -> Result<Vec<Album>> {
        self.inner.list().await
    }

    /// Persist `album` and mark it saved.
    pub async fn save(&self, album: Album) -> Result<Album> {
        let record = AlbumMapper.to_store_shape(&album);
        let _sync = self.inner.sync.lock().await;

        self.inner
            .store
            .save(&record)
            .await
            .map_err(LibraryError::save_failed)?;

        if let Err(e) = self.inner.membership.add(&record.id).await {
            warn!(album_id = %record.id, error = %e, "Album saved but membership not persisted");
        }

        debug!(album_id = %record.id, "Album added to library");
        Ok(album)
    }

    /// Delete `album` and clear its saved mark.
    ///
    /// An album that is not in the store is a [`LibraryError::RemoveFailed`].
    pub async fn remove(&self, album: Album) -> Result<Album> {
        let id = album.id();
        let _sync = self.inner.sync.lock().await;

        self.inner
            .store
            .delete(&id)
            .await
            .map_err(LibraryError::remove_failed)?;

        if let Err(e) = self.inner.membership.remove(&id).await {
            warn!(album_id = %id, error = %e, "Album removed but membership not persisted");
        }

        debug!(album_id = %id, "Album removed from library");
        Ok(album)
    }

    pub fn is_saved(&self, album: &Album) -> bool {
        self.inner.membership.contains(&album.id())
    }

    /// Register `observer` for store changes.
    ///
    /// Must be called from within a Tokio runtime the first time, since that
    /// call starts the listener task.
    pub fn add_change_observer<F>(&self, observer: F) -> Result<ObserverId>
    where
        F: Fn(&[Album]) + Send + Sync + 'static,
    {
        self.ensure_listener()?;

        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(observer)));

        debug!(observer = id.0, "Change observer registered");
        Ok(id)
    }

    /// Unregister an observer. Returns `false` if the id was unknown.
    pub fn remove_change_observer(&self, id: ObserverId) -> bool {
        let mut observers = self
            .inner
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        before != observers.len()
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn ensure_listener(&self) -> Result<()> {
        let mut listener = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if listener.is_some() {
            return Ok(());
        }

        let handle = Handle::try_current().map_err(|e| LibraryError::NoRuntime(e.to_string()))?;

        // Subscribe before spawning so no change between registration and the
        // first poll is lost.
        let events = EventStream::new(self.inner.store.subscribe())
            .filter(|event| matches!(event, CoreEvent::Library(_)));
        let inner = Arc::downgrade(&self.inner);

        *listener = Some(handle.spawn(listen(inner, events)));
        info!("Library change listener started");
        Ok(())
    }
}

impl Drop for LibrarySyncService {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}

impl Inner {
    async fn list(&self) -> Result<Vec<Album>> {
        let _sync = self.sync.lock().await;
        let records = self
            .store
            .fetch_all()
            .await
            .map_err(LibraryError::fetch_failed)?;

        let keys: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let albums: Vec<Album> = records
            .into_iter()
            .filter_map(|r| AlbumMapper.from_store_shape(r))
            .collect();

        if let Err(e) = self.membership.replace_all(keys).await {
            warn!(error = %e, "Failed to persist library membership");
        }

        Ok(albums)
    }

    fn observers(&self) -> Vec<ChangeObserver> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }
}

async fn listen(inner: Weak<Inner>, mut events: EventStream) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(event = event.description(), "Library change received");
            }
            Err(RecvError::Lagged(skipped)) => {
                // Missed events only mean the list is stale; one reload covers them.
                warn!(skipped, "Library change listener lagged");
            }
            Err(RecvError::Closed) => break,
        }

        let Some(inner) = inner.upgrade() else {
            break;
        };

        let albums = match inner.list().await {
            Ok(albums) => albums,
            Err(e) => {
                warn!(error = %e, "Skipping change notification, reload failed");
                continue;
            }
        };

        for observer in inner.observers() {
            observer(&albums);
        }
    }

    debug!("Library change listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::store::SqliteLibraryStore;
    use async_trait::async_trait;
    use bridge_desktop::InMemorySettingsStore;
    use core_runtime::events::{EventBus, Receiver};
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify, Semaphore};

    async fn service_with_bus(bus: EventBus) -> LibrarySyncService {
        let pool = create_test_pool().await.unwrap();
        let store = Arc::new(SqliteLibraryStore::new(pool, bus));
        let membership = Arc::new(MembershipCache::new(Arc::new(InMemorySettingsStore::new())));
        LibrarySyncService::new(store, membership)
    }

    async fn service() -> LibrarySyncService {
        service_with_bus(EventBus::new(16)).await
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Vec<Album>>) -> Vec<Album> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("observer was not notified")
            .expect("observer channel closed")
    }

    #[tokio::test]
    async fn test_save_and_remove_update_membership() {
        let service = service().await;
        let album = Album::new("Ride the Lightning", "Metallica");

        service.save(album.clone()).await.unwrap();
        assert!(service.is_saved(&album));
        assert!(service.membership().contains("Ride the LightningMetallica"));

        service.remove(album.clone()).await.unwrap();
        assert!(!service.is_saved(&album));
    }

    #[tokio::test]
    async fn test_save_then_remove_leaves_list_without_album() {
        let service = service().await;
        service.save(Album::new("Keep", "A")).await.unwrap();
        service.save(Album::new("X", "B")).await.unwrap();
        service.remove(Album::new("X", "B")).await.unwrap();

        let albums = service.list().await.unwrap();
        assert_eq!(albums.len(), 1);
        assert!(albums.iter().all(|a| a.name != "X"));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_membership_untouched() {
        let service = service().await;
        let album = Album::new("Dup", "A");
        service.save(album.clone()).await.unwrap();
        service.membership().remove(&album.id()).await.unwrap();

        let err = service.save(album.clone()).await.unwrap_err();
        assert!(matches!(err, LibraryError::SaveFailed(_)));
        assert!(!service.is_saved(&album));
    }

    #[tokio::test]
    async fn test_remove_unknown_album_is_remove_failed() {
        let service = service().await;
        let err = service.remove(Album::new("Ghost", "Nobody")).await.unwrap_err();

        assert!(matches!(err, LibraryError::RemoveFailed(_)));
        assert_eq!(
            err.description(),
            "There was a problem removing this album. Please try again."
        );
    }

    #[tokio::test]
    async fn test_list_rebuilds_membership_from_store() {
        let service = service().await;
        service.save(Album::new("One", "A")).await.unwrap();
        service.membership().replace_all(vec!["stale".to_string()]).await.unwrap();

        service.list().await.unwrap();
        assert_eq!(service.membership().snapshot(), vec!["OneA".to_string()]);
    }

    #[tokio::test]
    async fn test_two_observers_notified_once_with_same_list() {
        let service = service().await;
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        service
            .add_change_observer(move |albums| {
                let _ = tx_a.send(albums.to_vec());
            })
            .unwrap();
        service
            .add_change_observer(move |albums| {
                let _ = tx_b.send(albums.to_vec());
            })
            .unwrap();

        service.save(Album::new("Saved", "Artist")).await.unwrap();

        let a = next(&mut rx_a).await;
        let b = next(&mut rx_b).await;
        assert_eq!(a, vec![Album::new("Saved", "Artist")]);
        assert_eq!(a, b);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_removed_observer_is_not_called() {
        let service = service().await;
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        let first = service
            .add_change_observer(move |albums| {
                let _ = tx_a.send(albums.to_vec());
            })
            .unwrap();
        service
            .add_change_observer(move |albums| {
                let _ = tx_b.send(albums.to_vec());
            })
            .unwrap();

        assert!(service.remove_change_observer(first));
        assert!(!service.remove_change_observer(first));
        assert_eq!(service.observer_count(), 1);

        service.save(Album::new("Only", "B")).await.unwrap();
        next(&mut rx_b).await;
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_changes_from_another_service_reach_observers() {
        let bus = EventBus::new(16);
        let pool = create_test_pool().await.unwrap();
        let store: Arc<dyn PersistentStore<AlbumRecord>> =
            Arc::new(SqliteLibraryStore::new(pool, bus));
        let settings = Arc::new(InMemorySettingsStore::new());

        let library_view = LibrarySyncService::new(
            Arc::clone(&store),
            Arc::new(MembershipCache::new(settings.clone())),
        );
        let detail_view =
            LibrarySyncService::new(store, Arc::new(MembershipCache::new(settings)));

        let (tx, mut rx) = mpsc::unbounded_channel();
        library_view
            .add_change_observer(move |albums| {
                let _ = tx.send(albums.to_vec());
            })
            .unwrap();

        detail_view.save(Album::new("Elsewhere", "C")).await.unwrap();
        let albums = next(&mut rx).await;
        assert_eq!(albums[0].name, "Elsewhere");
        assert!(library_view.membership().contains("ElsewhereC"));
    }

    #[tokio::test]
    async fn test_observer_may_mutate_the_library() {
        let service = Arc::new(service().await);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let weak = Arc::downgrade(&service);
        service
            .add_change_observer(move |albums| {
                let _ = tx.send(albums.to_vec());
                if albums.iter().any(|a| a.name == "Trigger") {
                    if let Some(service) = weak.upgrade() {
                        tokio::spawn(async move {
                            let _ = service.remove(Album::new("Trigger", "D")).await;
                        });
                    }
                }
            })
            .unwrap();

        service.save(Album::new("Trigger", "D")).await.unwrap();
        assert_eq!(next(&mut rx).await.len(), 1);
        assert!(next(&mut rx).await.is_empty());
    }

    struct FailingStore {
        bus: EventBus,
    }

    #[async_trait]
    impl PersistentStore<AlbumRecord> for FailingStore {
        async fn fetch_all(&self) -> Result<Vec<AlbumRecord>> {
            Err(LibraryError::Database(sqlx::Error::PoolClosed))
        }

        async fn save(&self, _record: &AlbumRecord) -> Result<()> {
            Err(LibraryError::Database(sqlx::Error::PoolClosed))
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Err(LibraryError::Database(sqlx::Error::PoolClosed))
        }

        fn subscribe(&self) -> Receiver<CoreEvent> {
            self.bus.subscribe()
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_and_keeps_membership() {
        let membership = Arc::new(MembershipCache::new(Arc::new(InMemorySettingsStore::new())));
        membership.add("kept").await.unwrap();
        let service = LibrarySyncService::new(
            Arc::new(FailingStore {
                bus: EventBus::new(4),
            }),
            Arc::clone(&membership),
        );

        let err = service.list().await.unwrap_err();
        assert!(matches!(err, LibraryError::FetchFailed(_)));
        assert_eq!(
            err.description(),
            "There was an error fetching your local albums. Please try again."
        );
        assert!(membership.contains("kept"));
    }

    /// Wraps the SQLite store and holds the next `fetch_all` after it has
    /// read its rows, until released.
    struct GatedStore {
        inner: SqliteLibraryStore,
        armed: AtomicBool,
        paused: Notify,
        release: Semaphore,
    }

    impl GatedStore {
        async fn new() -> Self {
            let pool = create_test_pool().await.unwrap();
            Self {
                inner: SqliteLibraryStore::new(pool, EventBus::new(16)),
                armed: AtomicBool::new(false),
                paused: Notify::new(),
                release: Semaphore::new(0),
            }
        }
    }

    #[async_trait]
    impl PersistentStore<AlbumRecord> for GatedStore {
        async fn fetch_all(&self) -> Result<Vec<AlbumRecord>> {
            let records = self.inner.fetch_all().await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.paused.notify_one();
                self.release.acquire().await.unwrap().forget();
            }
            Ok(records)
        }

        async fn save(&self, record: &AlbumRecord) -> Result<()> {
            self.inner.save(record).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        fn subscribe(&self) -> Receiver<CoreEvent> {
            self.inner.subscribe()
        }
    }

    async fn gated_service() -> (Arc<LibrarySyncService>, Arc<GatedStore>) {
        let store = Arc::new(GatedStore::new().await);
        let membership = Arc::new(MembershipCache::new(Arc::new(InMemorySettingsStore::new())));
        let service = Arc::new(LibrarySyncService::new(
            Arc::clone(&store) as Arc<dyn PersistentStore<AlbumRecord>>,
            membership,
        ));
        service.add_change_observer(|_| {}).unwrap();
        (service, store)
    }

    async fn wait_paused(store: &GatedStore) {
        tokio::time::timeout(Duration::from_secs(5), store.paused.notified())
            .await
            .expect("reload never started");
    }

    #[tokio::test]
    async fn test_remove_during_reload_stays_removed() {
        let (service, store) = gated_service().await;
        let album = Album::new("X", "A");

        store.armed.store(true, Ordering::SeqCst);
        service.save(album.clone()).await.unwrap();
        wait_paused(&store).await;

        // The reload has already read a snapshot that still holds the album.
        let remover = {
            let service = Arc::clone(&service);
            let album = album.clone();
            tokio::spawn(async move { service.remove(album).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.release.add_permits(1);

        remover.await.unwrap().unwrap();
        assert!(!service.is_saved(&album));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!service.is_saved(&album));
        assert!(service.membership().is_empty());
    }

    #[tokio::test]
    async fn test_save_during_reload_stays_saved() {
        let (service, store) = gated_service().await;
        let earlier = Album::new("Earlier", "B");
        let album = Album::new("Later", "B");

        store.armed.store(true, Ordering::SeqCst);
        service.save(earlier.clone()).await.unwrap();
        wait_paused(&store).await;

        // The reload snapshot predates the second save.
        let saver = {
            let service = Arc::clone(&service);
            let album = album.clone();
            tokio::spawn(async move { service.save(album).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.release.add_permits(1);

        saver.await.unwrap().unwrap();
        assert!(service.is_saved(&album));
        assert!(service.is_saved(&earlier));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.is_saved(&album));
        assert_eq!(
            service.membership().snapshot(),
            vec!["EarlierB".to_string(), "LaterB".to_string()]
        );
    }

    #[test]
    fn test_add_observer_without_runtime_fails() {
        let service = LibrarySyncService::new(
            Arc::new(FailingStore {
                bus: EventBus::new(4),
            }),
            Arc::new(MembershipCache::new(Arc::new(InMemorySettingsStore::new()))),
        );

        let err = service.add_change_observer(|_| {}).unwrap_err();
        assert!(matches!(err, LibraryError::NoRuntime(_)));
    }
}
