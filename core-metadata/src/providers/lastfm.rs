//! Last.fm API Client
//!
//! Catalog access through the Last.fm 2.0 REST API.
//!
//! ## API Methods
//!
//! - `artist.search` (paged artist matches with `opensearch:totalResults`)
//! - `album.getInfo` (album with tracks and wiki summary)
//! - `artist.getTopAlbums`
//!
//! Every request is a `GET` on the base URL with `method`, `api_key` and
//! `format=json` query parameters.
//!
//! ## Errors
//!
//! Last.fm reports failures as `{"error": <code>, "message": "..."}`, with
//! either a 2xx or a 4xx status. The code is classified into [`ApiError`];
//! transport failures, unexpected statuses and undecodable bodies are
//! [`ApiError::Undefined`]. Nothing is retried.
//!
//! ## Usage
//!
//! ```ignore
//! let client = LastFmClient::from_config(http_client, &config.lastfm)?;
//! let page = client.search_artists("radiohead", 1, 50).await?;
//! ```

use crate::catalog::CatalogSource;
use crate::error::{ApiError, Result};
use crate::models::{Artist, ArtistPage};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use core_async::sync::Mutex;
use core_async::time::{sleep, Duration, Instant};
use core_library::{Album, Track};
use core_runtime::config::LastFmConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{debug, warn};

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "MusicCompanionCore/0.1";

/// Last.fm image size used for album and artist artwork
const PREFERRED_IMAGE_SIZE: &str = "extralarge";

/// Last.fm API client
pub struct LastFmClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

/// Enforces a minimum delay between consecutive requests
struct RateLimiter {
    last_request: Option<Instant>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay: Duration) -> Self {
        Self {
            last_request: None,
            min_delay,
        }
    }

    async fn wait_if_needed(&mut self) {
        if self.min_delay.is_zero() {
            return;
        }

        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                let wait_time = self.min_delay - elapsed;
                debug!(wait_ms = wait_time.as_millis() as u64, "Rate limiting Last.fm request");
                sleep(wait_time).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

impl LastFmClient {
    /// Creates a client against the public Last.fm endpoint.
    ///
    /// `rate_limit_delay_ms` is the minimum delay between requests; `0`
    /// disables throttling.
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: String, rate_limit_delay_ms: u64) -> Self {
        Self {
            http_client,
            api_key,
            base_url: core_runtime::config::DEFAULT_LASTFM_BASE_URL.to_string(),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(Duration::from_millis(
                rate_limit_delay_ms,
            )))),
        }
    }

    /// Creates a client from validated configuration.
    pub fn from_config(
        http_client: Arc<dyn HttpClient>,
        config: &LastFmConfig,
    ) -> core_runtime::Result<Self> {
        config.validate()?;
        let api_key = config.api_key.clone().unwrap_or_default();

        Ok(Self::new(http_client, api_key, config.rate_limit_delay_ms).with_base_url(&config.base_url))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn method_url(&self, method: &str, params: &[(&str, &str)]) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let mut url = format!("{}{}method={}", self.base_url, separator, method);

        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        url.push_str("&api_key=");
        url.push_str(&urlencoding::encode(&self.api_key));
        url.push_str("&format=json");
        url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T> {
        let request = HttpRequest::get(self.method_url(method, params))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        self.rate_limiter.lock().await.wait_if_needed().await;

        debug!(method, "Querying Last.fm");
        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(method, error = %e, "Last.fm request failed");
            ApiError::Undefined
        })?;

        if let Ok(error) = serde_json::from_slice::<ErrorResponse>(&response.body) {
            let classified = ApiError::from_code(error.error);
            warn!(
                method,
                status = response.status,
                code = error.error,
                message = %error.message,
                "Last.fm returned an error"
            );
            return Err(classified);
        }

        if !response.is_success() {
            warn!(method, status = response.status, "Unexpected Last.fm status");
            return Err(ApiError::Undefined);
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            warn!(method, error = %e, "Failed to decode Last.fm response");
            ApiError::Undefined
        })
    }
}

#[async_trait]
impl CatalogSource for LastFmClient {
    async fn search_artists(&self, text: &str, page: u32, limit: u32) -> Result<ArtistPage> {
        let page_param = page.to_string();
        let limit_param = limit.to_string();

        let response: SearchResponse = self
            .call(
                "artist.search",
                &[
                    ("artist", text),
                    ("page", &page_param),
                    ("limit", &limit_param),
                ],
            )
            .await?;

        Ok(response.into())
    }

    async fn album_detail(&self, name: &str, artist: &str) -> Result<Album> {
        let response: AlbumInfoResponse = self
            .call("album.getInfo", &[("album", name), ("artist", artist)])
            .await?;

        Ok(response.album.into_album())
    }

    async fn top_albums(&self, artist: &str) -> Result<Vec<Album>> {
        let response: TopAlbumsResponse = self
            .call("artist.getTopAlbums", &[("artist", artist)])
            .await?;

        Ok(response
            .topalbums
            .album
            .into_vec()
            .into_iter()
            .map(AlbumDto::into_album)
            .collect())
    }

    async fn fetch_image(&self, url: &str) -> Result<Option<Bytes>> {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = HttpRequest::get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Image download failed");
            ApiError::Undefined
        })?;

        if !response.is_success() {
            warn!(status = response.status, "Image download returned an error status");
            return Ok(None);
        }

        if response.body.is_empty() {
            Ok(None)
        } else {
            Ok(Some(response.body))
        }
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: i64,
    #[serde(default)]
    message: String,
}

/// Last.fm sends a bare object instead of a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// Counts arrive as numbers or numeric strings depending on the method.
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Unsigned(n)) => n,
        Some(NumberOrText::Float(f)) if f >= 0.0 => f as u64,
        Some(NumberOrText::Text(text)) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

#[derive(Debug, Deserialize)]
struct ImageDto {
    #[serde(rename = "#text", default)]
    url: String,
    #[serde(default)]
    size: String,
}

fn preferred_image(images: &[ImageDto]) -> Option<String> {
    images
        .iter()
        .find(|image| image.size == PREFERRED_IMAGE_SIZE)
        .map(|image| image.url.clone())
        .filter(|url| !url.is_empty())
}

/// Artist given either as a plain name or as an object with a `name`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtistRef {
    Name(String),
    Object { name: String },
}

impl ArtistRef {
    fn into_name(self) -> String {
        match self {
            ArtistRef::Name(name) | ArtistRef::Object { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(rename = "opensearch:totalResults", default, deserialize_with = "lenient_u64")]
    total_results: u64,
    artistmatches: ArtistMatches,
}

#[derive(Debug, Deserialize)]
struct ArtistMatches {
    #[serde(default)]
    artist: OneOrMany<ArtistDto>,
}

#[derive(Debug, Deserialize)]
struct ArtistDto {
    name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    listeners: u64,
    #[serde(default)]
    image: Vec<ImageDto>,
}

impl From<SearchResponse> for ArtistPage {
    fn from(response: SearchResponse) -> Self {
        let matches = response
            .results
            .artistmatches
            .artist
            .into_vec()
            .into_iter()
            .map(|dto| Artist {
                image_url: preferred_image(&dto.image),
                name: dto.name,
                listeners: dto.listeners,
            })
            .collect();

        ArtistPage {
            matches,
            total_count: response.results.total_results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlbumInfoResponse {
    album: AlbumDto,
}

#[derive(Debug, Deserialize)]
struct TopAlbumsResponse {
    topalbums: TopAlbumsDto,
}

#[derive(Debug, Deserialize)]
struct TopAlbumsDto {
    #[serde(default)]
    album: OneOrMany<AlbumDto>,
}

#[derive(Debug, Deserialize)]
struct AlbumDto {
    name: String,
    artist: ArtistRef,
    #[serde(default)]
    image: Vec<ImageDto>,
    #[serde(default)]
    tracks: Option<TracksDto>,
    #[serde(default)]
    wiki: Option<WikiDto>,
}

#[derive(Debug, Deserialize)]
struct TracksDto {
    #[serde(default)]
    track: OneOrMany<TrackDto>,
}

#[derive(Debug, Deserialize)]
struct TrackDto {
    name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    duration: u64,
    #[serde(rename = "@attr", default)]
    attr: Option<RankAttr>,
    artist: ArtistRef,
}

#[derive(Debug, Deserialize)]
struct RankAttr {
    #[serde(default, deserialize_with = "lenient_u64")]
    rank: u64,
}

#[derive(Debug, Deserialize)]
struct WikiDto {
    #[serde(default)]
    content: String,
}

impl AlbumDto {
    fn into_album(self) -> Album {
        let artist = self.artist.into_name();
        let image_url = preferred_image(&self.image);

        let mut tracks: Vec<Track> = self
            .tracks
            .map(|tracks| tracks.track.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(TrackDto::into_track)
            .collect();
        tracks.sort_by_key(|track| track.rank);

        Album {
            name: self.name,
            artist,
            image_url,
            tracks,
            description: self
                .wiki
                .map(|wiki| wiki.content)
                .filter(|content| !content.trim().is_empty()),
            image: None,
        }
    }
}

impl TrackDto {
    fn into_track(self) -> Option<Track> {
        let rank = self.attr.map(|attr| attr.rank).unwrap_or(0);
        let rank = match u32::try_from(rank) {
            Ok(rank) if rank > 0 => rank,
            _ => {
                debug!(track = %self.name, "Dropping track without a rank");
                return None;
            }
        };

        Some(Track {
            name: self.name,
            duration_secs: u32::try_from(self.duration).unwrap_or(u32::MAX),
            rank,
            artist: self.artist.into_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> LastFmClient {
        struct Unreachable;

        #[async_trait]
        impl HttpClient for Unreachable {
            async fn execute(
                &self,
                _request: HttpRequest,
            ) -> bridge_traits::error::Result<bridge_traits::http::HttpResponse> {
                Err(bridge_traits::error::BridgeError::NotAvailable(
                    "offline".to_string(),
                ))
            }
        }

        LastFmClient::new(Arc::new(Unreachable), "k3y".to_string(), 0)
    }

    #[test]
    fn test_method_url_encodes_parameters() {
        let url = client().method_url("artist.search", &[("artist", "AC/DC & Friends"), ("page", "2")]);

        assert_eq!(
            url,
            "https://ws.audioscrobbler.com/2.0/?method=artist.search\
             &artist=AC%2FDC%20%26%20Friends&page=2&api_key=k3y&format=json"
        );
    }

    #[test]
    fn test_method_url_with_existing_query() {
        let url = client()
            .with_base_url("http://localhost/api?v=2")
            .method_url("album.getInfo", &[]);
        assert!(url.starts_with("http://localhost/api?v=2&method=album.getInfo&"));
    }

    #[test]
    fn test_decode_search_page() {
        let body = r##"{
            "results": {
                "opensearch:totalResults": "2",
                "artistmatches": {
                    "artist": [
                        {"name": "Cher", "listeners": "1234567", "image": [
                            {"#text": "https://img/s.png", "size": "small"},
                            {"#text": "https://img/xl.png", "size": "extralarge"}
                        ]},
                        {"name": "Cheryl", "listeners": "1500", "image": []}
                    ]
                }
            }
        }"##;

        let page: ArtistPage = serde_json::from_str::<SearchResponse>(body).unwrap().into();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.matches[0].name, "Cher");
        assert_eq!(page.matches[0].listeners, 1_234_567);
        assert_eq!(page.matches[0].image_url.as_deref(), Some("https://img/xl.png"));
        assert_eq!(page.matches[1].image_url, None);
    }

    #[test]
    fn test_decode_album_detail_sorts_tracks() {
        let body = r##"{
            "album": {
                "name": "Believe",
                "artist": "Cher",
                "image": [{"#text": "", "size": "extralarge"}],
                "tracks": {"track": [
                    {"name": "Strong Enough", "duration": 223, "@attr": {"rank": 2}, "artist": {"name": "Cher"}},
                    {"name": "Believe", "duration": "239", "@attr": {"rank": "1"}, "artist": {"name": "Cher"}},
                    {"name": "Bonus", "duration": null, "artist": {"name": "Cher"}}
                ]},
                "wiki": {"content": "Twenty-second studio album"}
            }
        }"##;

        let album = serde_json::from_str::<AlbumInfoResponse>(body)
            .unwrap()
            .album
            .into_album();

        assert_eq!(album.id(), "BelieveCher");
        assert_eq!(album.image_url, None);
        assert_eq!(album.description.as_deref(), Some("Twenty-second studio album"));
        let names: Vec<&str> = album.tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Believe", "Strong Enough"]);
        assert_eq!(album.tracks[0].duration_secs, 239);
    }

    #[test]
    fn test_decode_single_track_album() {
        let body = r##"{
            "album": {
                "name": "Single",
                "artist": "Someone",
                "tracks": {"track": {"name": "Only", "duration": 100, "@attr": {"rank": 1}, "artist": {"name": "Someone"}}}
            }
        }"##;

        let album = serde_json::from_str::<AlbumInfoResponse>(body)
            .unwrap()
            .album
            .into_album();
        assert_eq!(album.tracks.len(), 1);
        assert_eq!(album.description, None);
    }

    #[test]
    fn test_decode_top_albums_with_nested_artist() {
        let body = r##"{
            "topalbums": {
                "album": [
                    {"name": "Believe", "artist": {"name": "Cher", "url": "x"}, "image": [
                        {"#text": "https://img/believe.png", "size": "extralarge"}
                    ]},
                    {"name": "Heart of Stone", "artist": {"name": "Cher"}}
                ]
            }
        }"##;

        let albums: Vec<Album> = serde_json::from_str::<TopAlbumsResponse>(body)
            .unwrap()
            .topalbums
            .album
            .into_vec()
            .into_iter()
            .map(AlbumDto::into_album)
            .collect();

        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].artist, "Cher");
        assert_eq!(albums[0].image_url.as_deref(), Some("https://img/believe.png"));
        assert!(albums[1].tracks.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_undefined() {
        let err = client().top_albums("Cher").await.unwrap_err();
        assert_eq!(err, ApiError::Undefined);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_spaces_requests() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;

        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
