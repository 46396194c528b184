//! # Core Configuration Module
//!
//! Builder-based configuration for the companion core.
//!
//! `CoreConfig` carries every injected bridge plus the tunables of the catalog
//! client and the search session. The builder validates eagerly so a host
//! learns about a missing capability at startup rather than on first use.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - remote catalog requests (desktop default: reqwest)
//! - `SettingsStore` - durable key-value slots (desktop default: SQLite
//!   `settings.db` next to the library database)
//!
//! With the `desktop-shims` feature both are created automatically when not
//! provided. Without it, a missing bridge fails with
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, LastFmConfig};
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/library.db")
//!     .lastfm(LastFmConfig::new().with_api_key("your_api_key"))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, SettingsStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable consulted for the Last.fm API key.
pub const LASTFM_API_KEY_ENV: &str = "LASTFM_API_KEY";

/// Public Last.fm web service endpoint.
pub const DEFAULT_LASTFM_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Core configuration for the companion core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite library database file
    pub database_path: PathBuf,

    pub http_client: Arc<dyn HttpClient>,

    pub settings_store: Arc<dyn SettingsStore>,

    pub lastfm: LastFmConfig,

    pub search: SearchConfig,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("lastfm", &self.lastfm)
            .field("search", &self.search)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

/// Last.fm catalog client settings.
///
/// The API key should never be hardcoded. Inject it from the host's secure
/// configuration or let [`LastFmConfig::from_env`] read `LASTFM_API_KEY`.
#[derive(Clone, PartialEq, Eq)]
pub struct LastFmConfig {
    /// Obtain a key from <https://www.last.fm/api/account/create>
    pub api_key: Option<String>,

    pub base_url: String,

    /// Minimum delay between two catalog requests; `0` disables throttling
    pub rate_limit_delay_ms: u64,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LastFmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastFmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .finish()
    }
}

impl LastFmConfig {
    /// No key, public endpoint, throttling disabled.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LASTFM_BASE_URL.to_string(),
            rate_limit_delay_ms: 0,
        }
    }

    /// Like [`new`](Self::new) but with the key taken from `LASTFM_API_KEY`
    /// when that variable is set and non-empty.
    pub fn from_env() -> Self {
        let api_key = std::env::var(LASTFM_API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Self {
            api_key,
            ..Self::new()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        match self.api_key.as_deref() {
            None => {
                return Err(Error::Config(format!(
                    "Last.fm API key is required. Use LastFmConfig::with_api_key() \
                     or set the {} environment variable.",
                    LASTFM_API_KEY_ENV
                )))
            }
            Some(key) if key.trim().is_empty() => {
                return Err(Error::Config("Last.fm API key cannot be empty".to_string()))
            }
            Some(_) => {}
        }

        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(Error::Config(format!(
                "Last.fm base URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.rate_limit_delay_ms > 60_000 {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Search session tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Results requested per page
    pub page_limit: u32,

    /// Maximum number of remembered queries
    pub recent_capacity: usize,

    /// Quiet period before typed input is submitted
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_limit: 50,
            recent_capacity: 20,
            debounce_ms: 400,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_limit == 0 || self.page_limit > 1000 {
            return Err(Error::Config(
                "Search page limit must be between 1 and 1000".to_string(),
            ));
        }

        if self.recent_capacity == 0 {
            return Err(Error::Config(
                "Recent search capacity must be greater than 0".to_string(),
            ));
        }

        if self.debounce_ms > 10_000 {
            return Err(Error::Config(
                "Search debounce exceeds maximum of 10 seconds (10,000ms)".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.lastfm.validate()?;
        self.search.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                  Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                  Mobile: inject the platform-native adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new().map_err(|e| {
        Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: format!("Failed to create default ReqwestHttpClient: {}", e),
        }
    })?;

    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    Err(Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for library membership \
                  and recent searches. \
                  Desktop: enable the 'desktop-shims' feature to use SqliteSettingsStore. \
                  Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    })
}

/// Settings live in `settings.db` beside the library database.
fn default_settings_path(database_path: &Path) -> PathBuf {
    database_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.join("settings.db"))
        .unwrap_or_else(|| PathBuf::from("settings.db"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(database_path: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use core_async::runtime::{self, Handle};
    use std::thread;

    let path = default_settings_path(database_path);

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        runtime::block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create runtime for default settings store: {}",
                    e
                ))
            })?
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on cannot run on a runtime worker; hop to a plain thread there.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Settings store initialization thread panicked".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    lastfm: Option<LastFmConfig>,
    search: Option<SearchConfig>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the path of the SQLite library database.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, `ReqwestHttpClient` is used when the `desktop-shims`
    /// feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    ///
    /// If not provided, a `SqliteSettingsStore` beside the database is used
    /// when the `desktop-shims` feature is enabled.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Sets the Last.fm client configuration.
    ///
    /// Default: [`LastFmConfig::from_env`].
    pub fn lastfm(mut self, config: LastFmConfig) -> Self {
        self.lastfm = Some(config);
        self
    }

    pub fn search(mut self, config: SearchConfig) -> Self {
        self.search = Some(config);
        self
    }

    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`](crate::events::DEFAULT_EVENT_BUFFER_SIZE)
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when a value is missing or out of range
    /// - `Error::CapabilityMissing` when a bridge was not injected and no
    ///   desktop default is available
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let lastfm = self.lastfm.unwrap_or_else(LastFmConfig::from_env);
        let search = self.search.unwrap_or_default();

        // Validate plain values before creating any default bridge.
        lastfm.validate()?;
        search.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(&database_path)?,
        };

        let config = CoreConfig {
            database_path,
            http_client,
            settings_store,
            lastfm,
            search,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
