//! Values returned by the remote catalog.

use serde::{Deserialize, Serialize};

/// An artist search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
    pub listeners: u64,
    pub image_url: Option<String>,
}

impl Artist {
    pub fn new(name: impl Into<String>, listeners: u64) -> Self {
        Self {
            name: name.into(),
            listeners,
            image_url: None,
        }
    }
}

/// One page of artist search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistPage {
    /// Matches in the order the catalog returned them
    pub matches: Vec<Artist>,
    /// Total number of matches across all pages, as reported by the server
    pub total_count: u64,
}
