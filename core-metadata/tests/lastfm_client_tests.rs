//! Integration tests for the Last.fm catalog client against a mocked transport.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_metadata::{ApiError, CatalogSource, LastFmClient};
use core_runtime::config::LastFmConfig;
use mockall::mock;
use std::sync::Arc;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn client_returning(status: u16, body: &'static str) -> LastFmClient {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(move |_| Ok(HttpResponse::new(status, body)));
    LastFmClient::new(Arc::new(http), "test-key".to_string(), 0)
}

#[tokio::test]
async fn test_search_sends_paging_parameters() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| {
            request.url.contains("method=artist.search")
                && request.url.contains("artist=daft%20punk")
                && request.url.contains("page=3")
                && request.url.contains("limit=50")
                && request.url.contains("api_key=test-key")
                && request.url.contains("format=json")
        })
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"results":{"opensearch:totalResults":"120","artistmatches":{"artist":[{"name":"Daft Punk","listeners":"3000001","image":[]}]}}}"#,
            ))
        });

    let client = LastFmClient::new(Arc::new(http), "test-key".to_string(), 0);
    let page = client.search_artists("daft punk", 3, 50).await.unwrap();

    assert_eq!(page.total_count, 120);
    assert_eq!(page.matches.len(), 1);
    assert_eq!(page.matches[0].listeners, 3_000_001);
}

#[tokio::test]
async fn test_error_body_is_classified() {
    let client = client_returning(
        200,
        r#"{"error":29,"message":"Rate Limit Exceeded"}"#,
    );
    let err = client.search_artists("x", 1, 50).await.unwrap_err();

    assert_eq!(err, ApiError::RateLimitExceeded);
    assert_eq!(
        err.description(),
        "Your IP has made too many requests in a short period."
    );
}

#[tokio::test]
async fn test_error_body_with_client_status_is_classified() {
    let client = client_returning(400, r#"{"error":6,"message":"Album not found"}"#);
    let err = client.album_detail("Nope", "Nobody").await.unwrap_err();
    assert_eq!(err, ApiError::InvalidParameter);
}

#[tokio::test]
async fn test_unknown_code_is_undefined() {
    let client = client_returning(200, r#"{"error":10,"message":"Invalid API key"}"#);
    let err = client.top_albums("Cher").await.unwrap_err();
    assert_eq!(err, ApiError::Undefined);
}

#[tokio::test]
async fn test_server_error_without_body_is_undefined() {
    let client = client_returning(503, "Service Unavailable");
    assert_eq!(
        client.top_albums("Cher").await.unwrap_err(),
        ApiError::Undefined
    );
}

#[tokio::test]
async fn test_garbage_body_is_undefined() {
    let client = client_returning(200, "<html>not json</html>");
    assert_eq!(
        client.search_artists("x", 1, 50).await.unwrap_err(),
        ApiError::Undefined
    );
}

#[tokio::test]
async fn test_transport_error_is_undefined() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

    let client = LastFmClient::new(Arc::new(http), "test-key".to_string(), 0);
    assert_eq!(
        client.album_detail("a", "b").await.unwrap_err(),
        ApiError::Undefined
    );
}

#[tokio::test]
async fn test_album_detail_decodes_tracks() {
    let client = client_returning(
        200,
        r##"{"album":{"name":"Discovery","artist":"Daft Punk","image":[{"#text":"https://img/d.png","size":"extralarge"}],
            "tracks":{"track":[
                {"name":"Digital Love","duration":301,"@attr":{"rank":3},"artist":{"name":"Daft Punk"}},
                {"name":"One More Time","duration":320,"@attr":{"rank":1},"artist":{"name":"Daft Punk"}},
                {"name":"Aerodynamic","duration":212,"@attr":{"rank":2},"artist":{"name":"Daft Punk"}}
            ]}}}"##,
    );

    let album = client.album_detail("Discovery", "Daft Punk").await.unwrap();
    assert_eq!(album.image_url.as_deref(), Some("https://img/d.png"));
    let ranks: Vec<u32> = album.tracks.iter().map(|t| t.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_image() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| request.url == "https://img/cover.png")
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, vec![1u8, 2, 3])));
    let client = LastFmClient::new(Arc::new(http), "k".to_string(), 0);
    assert_eq!(
        client.fetch_image("https://img/cover.png").await.unwrap().as_deref(),
        Some(&[1u8, 2, 3][..])
    );

    let client = client_returning(404, "");
    assert_eq!(client.fetch_image("https://img/missing.png").await.unwrap(), None);
}

#[test]
fn test_from_config_requires_api_key() {
    let http = Arc::new(MockHttp::new());

    assert!(LastFmClient::from_config(http.clone(), &LastFmConfig::new()).is_err());
    assert!(
        LastFmClient::from_config(http, &LastFmConfig::new().with_api_key("key")).is_ok()
    );
}
