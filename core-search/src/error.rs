use bridge_traits::error::BridgeError;
use core_metadata::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Catalog error: {0}")]
    Api(#[from] ApiError),

    #[error("Recent searches could not be stored: {0}")]
    Storage(#[from] BridgeError),

    /// A newer query replaced the session while this request was in flight.
    #[error("Search superseded by a newer query (generation {generation})")]
    Superseded { generation: u64 },

    #[error("Debouncer has shut down")]
    Closed,
}

impl SearchError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, SearchError::Superseded { .. })
    }

    /// Message suitable for showing to the user.
    pub fn description(&self) -> &'static str {
        match self {
            SearchError::Api(api) => api.description(),
            _ => "We ran into a problem. Please try again.",
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
