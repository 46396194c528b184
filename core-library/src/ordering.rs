//! Presentation order for library listings.

use crate::models::Album;

/// Albums grouped by artist, then by album name within an artist.
///
/// Comparison is plain string ordering, so it is case-sensitive.
pub fn library_order(mut albums: Vec<Album>) -> Vec<Album> {
    albums.sort_by(|a, b| a.artist.cmp(&b.artist).then_with(|| a.name.cmp(&b.name)));
    albums
}
