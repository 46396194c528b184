//! # Recent Queries
//!
//! Most-recent-first list of past search strings, bounded and free of
//! duplicates, persisted to a settings slot after every mutation.

use crate::error::Result;
use bridge_traits::error::BridgeError;
use bridge_traits::storage::SettingsStore;
use core_async::sync::Mutex;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Settings slot holding the recent queries as a JSON string array.
pub const RECENT_SEARCHES_SLOT: &str = "recentSearches";

pub const DEFAULT_RECENT_CAPACITY: usize = 20;

pub struct RecentQueries {
    settings: Arc<dyn SettingsStore>,
    capacity: usize,
    entries: RwLock<Vec<String>>,
    persist_lock: Mutex<()>,
}

impl RecentQueries {
    /// Empty list; nothing is read from `settings` until [`load`](Self::load).
    pub fn new(settings: Arc<dyn SettingsStore>, capacity: usize) -> Self {
        Self {
            settings,
            capacity: capacity.max(1),
            entries: RwLock::new(Vec::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Restore the persisted list, truncated to capacity.
    ///
    /// A malformed slot loads as empty.
    pub async fn load(&self) -> Result<()> {
        let mut entries = match self.settings.get_string_list(RECENT_SEARCHES_SLOT).await {
            Ok(entries) => entries,
            Err(BridgeError::MalformedValue { reason, .. }) => {
                warn!(slot = RECENT_SEARCHES_SLOT, %reason, "Ignoring malformed recent searches");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        entries.truncate(self.capacity);

        debug!(count = entries.len(), "Loaded recent searches");
        *self.write() = entries;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current entries, most recent first.
    pub fn entries(&self) -> Vec<String> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Move `query` to the front, inserting it if absent. The oldest entry
    /// falls off when the list is over capacity.
    pub async fn add(&self, query: &str) -> Result<()> {
        {
            let mut entries = self.write();
            entries.retain(|existing| existing != query);
            entries.insert(0, query.to_string());
            entries.truncate(self.capacity);
        }
        self.persist().await
    }

    /// Remove the entry at `index`. Out-of-range indices are ignored.
    pub async fn remove_at(&self, index: usize) -> Result<()> {
        {
            let mut entries = self.write();
            if index >= entries.len() {
                return Ok(());
            }
            entries.remove(index);
        }
        self.persist().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.write().clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let entries = self.entries();
        self.settings
            .set_string_list(RECENT_SEARCHES_SLOT, &entries)
            .await?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<String>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<String>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for RecentQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentQueries")
            .field("capacity", &self.capacity)
            .field("entries", &*self.read())
            .finish()
    }
}
