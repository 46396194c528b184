use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] core_metadata::ApiError),

    #[error("Search error: {0}")]
    Search(#[from] core_search::SearchError),
}

impl CoreError {
    /// Message suitable for showing to the user.
    pub fn description(&self) -> &'static str {
        match self {
            CoreError::Library(e) => e.description(),
            CoreError::Catalog(e) => e.description(),
            CoreError::Search(e) => e.description(),
            _ => "We ran into a problem. Please try again.",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
