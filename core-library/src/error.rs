use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with id {id}")]
    AlreadyExists { entity_type: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    #[error("Fetching local albums failed: {0}")]
    FetchFailed(#[source] Box<LibraryError>),

    #[error("Saving album failed: {0}")]
    SaveFailed(#[source] Box<LibraryError>),

    #[error("Removing album failed: {0}")]
    RemoveFailed(#[source] Box<LibraryError>),
}

impl LibraryError {
    pub(crate) fn fetch_failed(source: LibraryError) -> Self {
        Self::FetchFailed(Box::new(source))
    }

    pub(crate) fn save_failed(source: LibraryError) -> Self {
        Self::SaveFailed(Box::new(source))
    }

    pub(crate) fn remove_failed(source: LibraryError) -> Self {
        Self::RemoveFailed(Box::new(source))
    }

    /// Message suitable for showing to the user.
    pub fn description(&self) -> &'static str {
        match self {
            LibraryError::FetchFailed(_) => {
                "There was an error fetching your local albums. Please try again."
            }
            LibraryError::SaveFailed(_) => {
                "There was a problem saving this album. Please try another one."
            }
            LibraryError::RemoveFailed(_) => {
                "There was a problem removing this album. Please try again."
            }
            _ => "We ran into a problem. Please try again.",
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
