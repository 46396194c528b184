//! # Membership Cache
//!
//! The set of album keys known to be saved locally, mirrored into a durable
//! settings slot so `is saved` lookups survive restarts without touching the
//! database.

use crate::error::Result;
use bridge_traits::error::BridgeError;
use bridge_traits::storage::SettingsStore;
use core_async::sync::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Settings slot holding the saved album keys as a JSON string array.
pub const MEMBERSHIP_SLOT: &str = "localAlbums";

pub struct MembershipCache {
    settings: Arc<dyn SettingsStore>,
    ids: RwLock<HashSet<String>>,
    // Serializes slot writes so a stale snapshot never lands after a newer one.
    persist_lock: Mutex<()>,
}

impl MembershipCache {
    /// Empty cache backed by `settings`. Call [`load`](Self::load) to restore
    /// the persisted slot.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            ids: RwLock::new(HashSet::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Restore membership from the durable slot.
    ///
    /// A malformed slot is treated as empty; the next mutation overwrites it.
    pub async fn load(&self) -> Result<()> {
        let ids = match self.settings.get_string_list(MEMBERSHIP_SLOT).await {
            Ok(ids) => ids,
            Err(BridgeError::MalformedValue { reason, .. }) => {
                warn!(slot = MEMBERSHIP_SLOT, %reason, "Ignoring malformed membership slot");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        debug!(count = ids.len(), "Loaded library membership");
        *self.write() = ids.into_iter().collect();
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Sorted copy of the current keys.
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Replace the whole set, typically after a full reload from the store.
    pub async fn replace_all<I>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        *self.write() = ids.into_iter().collect();
        self.persist().await
    }

    pub async fn add(&self, id: &str) -> Result<()> {
        self.write().insert(id.to_string());
        self.persist().await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.write().remove(id);
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let ids = self.snapshot();
        self.settings.set_string_list(MEMBERSHIP_SLOT, &ids).await?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashSet<String>> {
        self.ids.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashSet<String>> {
        self.ids.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for MembershipCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipCache")
            .field("len", &self.len())
            .finish()
    }
}
