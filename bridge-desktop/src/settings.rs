//! Settings storage backends

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::SettingsStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::debug;

const CREATE_SETTINGS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
"#;

fn db_error(action: &str, e: sqlx::Error) -> BridgeError {
    BridgeError::DatabaseError(format!("Failed to {}: {}", action, e))
}

/// SQLite-backed settings store
///
/// Every value lives in one row of the `settings` table; writes are upserts.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Open (or create) the settings database at `db_path`
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // SQLite URLs always use forward slashes
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path_str))
            .map_err(|e| db_error("parse settings path", e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .map_err(|e| db_error("connect to settings DB", e))?;

        let store = Self::with_pool(pool).await?;
        debug!(path = ?db_path, "Initialized settings store");
        Ok(store)
    }

    /// Create an in-memory SQLite settings store (for testing)
    ///
    /// The pool is pinned to a single connection so every query sees the same
    /// in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| db_error("connect to settings DB", e))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_SETTINGS_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| db_error("create settings table", e))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("set setting", e))?;

        debug!(key = key, "Stored setting");
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("get setting", e))?;

        Ok(row.map(|row| row.get(0)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete setting", e))?;

        debug!(key = key, "Deleted setting");
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("check key", e))?;

        Ok(row.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list keys", e))?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    async fn clear_all(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("clear settings", e))?;

        debug!("Cleared all settings");
        Ok(())
    }
}

/// Process-local settings store
///
/// Nothing is written to disk. Useful for tests and for hosts that do not
/// want search history to outlive the session.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| BridgeError::OperationFailed("settings lock poisoned".to_string()))
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.values()?.keys().cloned().collect())
    }

    async fn clear_all(&self) -> Result<()> {
        self.values()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_operations() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("test_key", "test_value").await.unwrap();
        assert_eq!(
            store.get_string("test_key").await.unwrap(),
            Some("test_value".to_string())
        );
        assert!(store.has_key("test_key").await.unwrap());

        store.delete("test_key").await.unwrap();
        assert_eq!(store.get_string("test_key").await.unwrap(), None);
        assert!(!store.has_key("test_key").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("theme", "light").await.unwrap();
        store.set_string("theme", "dark").await.unwrap();

        assert_eq!(
            store.get_string("theme").await.unwrap(),
            Some("dark".to_string())
        );
        assert_eq!(store.list_keys().await.unwrap(), vec!["theme"]);
    }

    #[tokio::test]
    async fn test_string_list_slots() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        let recent = vec!["Radiohead".to_string(), "Björk".to_string()];

        store.set_string_list("recentSearches", &recent).await.unwrap();

        assert_eq!(store.get_string_list("recentSearches").await.unwrap(), recent);
        assert!(store.get_string_list("localAlbums").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_and_clear() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        store.set_string("key2", "value2").await.unwrap();
        store.set_string("key1", "value1").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["key1", "key2"]);

        store.clear_all().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!(
            "companion-settings-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = dir.join("settings.db");

        {
            let store = SqliteSettingsStore::new(path.clone()).await.unwrap();
            store
                .set_string_list("localAlbums", &["BlueWeezer".to_string()])
                .await
                .unwrap();
        }

        let reopened = SqliteSettingsStore::new(path).await.unwrap();
        assert_eq!(
            reopened.get_string_list("localAlbums").await.unwrap(),
            vec!["BlueWeezer".to_string()]
        );

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySettingsStore::new();

        store.set_string("a", "1").await.unwrap();
        assert!(store.has_key("a").await.unwrap());
        assert_eq!(store.get_string("a").await.unwrap(), Some("1".to_string()));

        store.delete("a").await.unwrap();
        assert_eq!(store.get_string("a").await.unwrap(), None);
    }
}
