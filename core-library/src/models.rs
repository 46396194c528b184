//! Domain models for the saved-album library
//!
//! Albums and tracks are plain values. Their identity is a key derived from
//! the natural fields (`name` followed by the parent name) so that a record
//! coming from the remote catalog and one loaded from the local store compare
//! equal whenever they describe the same album.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::hash::{Hash, Hasher};

/// Build the stable key for a record from its name and its parent's name.
pub fn record_key(name: &str, parent: &str) -> String {
    let mut key = String::with_capacity(name.len() + parent.len());
    key.push_str(name);
    key.push_str(parent);
    key
}

// =============================================================================
// Domain values
// =============================================================================

/// An album, optionally carrying its tracks, annotation and cached artwork.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    pub artist: String,
    /// Remote artwork location, if the catalog provided one
    pub image_url: Option<String>,
    /// Tracks in ascending rank order
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Free-text annotation (the catalog's wiki summary)
    pub description: Option<String>,
    /// Cached artwork bytes
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

impl Album {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            image_url: None,
            tracks: Vec::new(),
            description: None,
            image: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }

    pub fn with_tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn id(&self) -> String {
        record_key(&self.name, &self.artist)
    }

    /// Total running time of all tracks, in seconds.
    pub fn total_duration_secs(&self) -> u64 {
        self.tracks.iter().map(|t| u64::from(t.duration_secs)).sum()
    }
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Album {}

impl Hash for Album {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// A single track of an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub duration_secs: u32,
    /// 1-based position within the album
    pub rank: u32,
    pub artist: String,
}

impl Track {
    pub fn new(name: impl Into<String>, duration_secs: u32, rank: u32, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration_secs,
            rank,
            artist: artist.into(),
        }
    }

    pub fn id(&self) -> String {
        record_key(&self.name, &self.artist)
    }
}

// =============================================================================
// Store shapes
// =============================================================================

/// Row shape of the `albums` table.
///
/// Every column except the primary key is nullable; rows missing a required
/// field are skipped when mapped back to an [`Album`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AlbumRecord {
    pub id: String,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub info: Option<String>,
    pub image: Option<Vec<u8>>,
    pub image_url: Option<String>,
    #[sqlx(skip)]
    pub tracks: Vec<TrackRecord>,
}

/// Row shape of the `tracks` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TrackRecord {
    pub album_id: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration: i64,
    /// Stored as text; parsed back to a positive integer
    pub rank: Option<String>,
    pub artist: Option<String>,
}
