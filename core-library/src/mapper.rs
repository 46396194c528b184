//! Conversion between domain values and store rows
//!
//! Each entity pair gets its own [`RecordMapper`] implementation. Mapping back
//! from the store is partial: a row lacking a required field yields `None` and
//! the caller skips it.

use crate::models::{record_key, Album, AlbumRecord, Track, TrackRecord};
use tracing::warn;

/// Bidirectional mapping between a domain value and its store shape.
pub trait RecordMapper {
    type Domain;
    type Shape;

    fn to_store_shape(&self, value: &Self::Domain) -> Self::Shape;

    fn from_store_shape(&self, shape: Self::Shape) -> Option<Self::Domain>;
}

/// Maps [`Album`] to [`AlbumRecord`], tracks included.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlbumMapper;

impl RecordMapper for AlbumMapper {
    type Domain = Album;
    type Shape = AlbumRecord;

    fn to_store_shape(&self, album: &Album) -> AlbumRecord {
        let id = album.id();
        let tracks = {
            let mapper = TrackMapper::new(&id);
            album.tracks.iter().map(|t| mapper.to_store_shape(t)).collect()
        };

        AlbumRecord {
            id,
            name: Some(album.name.clone()),
            artist: Some(album.artist.clone()),
            info: album.description.clone(),
            image: album.image.clone(),
            image_url: album.image_url.clone(),
            tracks,
        }
    }

    fn from_store_shape(&self, record: AlbumRecord) -> Option<Album> {
        let AlbumRecord {
            id,
            name,
            artist,
            info,
            image,
            image_url,
            tracks,
        } = record;

        let (Some(name), Some(artist)) = (name, artist) else {
            warn!(album_id = %id, "Skipping album row with missing name or artist");
            return None;
        };

        let mapper = TrackMapper::new(&id);
        let mut tracks: Vec<Track> = tracks
            .into_iter()
            .filter_map(|t| mapper.from_store_shape(t))
            .collect();
        tracks.sort_by_key(|t| t.rank);

        Some(Album {
            name,
            artist,
            image_url,
            tracks,
            description: info,
            image,
        })
    }
}

/// Maps [`Track`] to [`TrackRecord`] for the album identified by `album_id`.
#[derive(Debug, Clone, Copy)]
pub struct TrackMapper<'a> {
    album_id: &'a str,
}

impl<'a> TrackMapper<'a> {
    pub fn new(album_id: &'a str) -> Self {
        Self { album_id }
    }
}

impl RecordMapper for TrackMapper<'_> {
    type Domain = Track;
    type Shape = TrackRecord;

    fn to_store_shape(&self, track: &Track) -> TrackRecord {
        TrackRecord {
            album_id: self.album_id.to_string(),
            id: Some(record_key(&track.name, &track.artist)),
            name: Some(track.name.clone()),
            duration: i64::from(track.duration_secs),
            rank: Some(track.rank.to_string()),
            artist: Some(track.artist.clone()),
        }
    }

    fn from_store_shape(&self, record: TrackRecord) -> Option<Track> {
        let (Some(_), Some(name), Some(rank), Some(artist)) =
            (record.id, record.name, record.rank, record.artist)
        else {
            return None;
        };

        let rank = match rank.trim().parse::<u32>() {
            Ok(rank) if rank > 0 => rank,
            _ => {
                warn!(album_id = %self.album_id, track = %name, rank = %rank, "Skipping track with invalid rank");
                return None;
            }
        };

        let duration_secs = u32::try_from(record.duration.max(0)).unwrap_or(u32::MAX);

        Some(Track {
            name,
            duration_secs,
            rank,
            artist,
        })
    }
}
