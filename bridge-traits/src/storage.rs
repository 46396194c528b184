//! Key-value settings storage
//!
//! Durable slots for small pieces of state that must survive restarts, such as
//! the set of saved album identifiers or the recent search list.

use async_trait::async_trait;

use crate::error::{BridgeError, Result};

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - iOS: UserDefaults
/// - Android: SharedPreferences / DataStore
/// - Desktop: SQLite settings table
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string_list("recentSearches", &["Radiohead".to_string()]).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;

    /// Store an ordered list of strings as a JSON array.
    async fn set_string_list(&self, key: &str, values: &[String]) -> Result<()> {
        let encoded = serde_json::to_string(values).map_err(|e| BridgeError::MalformedValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set_string(key, &encoded).await
    }

    /// Retrieve a list previously written with [`set_string_list`].
    ///
    /// A missing key yields an empty list. A value that is not a JSON string
    /// array is reported as [`BridgeError::MalformedValue`].
    ///
    /// [`set_string_list`]: SettingsStore::set_string_list
    async fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.get_string(key).await? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| BridgeError::MalformedValue {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
