//! TMDB client behavior against a mock upstream: retry policy, error
//! taxonomy, response decoding.

use std::time::Duration;

use moodreel::tmdb::{TmdbClient, TmdbError};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client(base_url: String) -> TmdbClient {
    let http = reqwest::Client::builder().timeout(Duration::from_secs(5)).build().unwrap();
    TmdbClient::new(http, "test-key".to_string(), base_url)
}

#[tokio::test]
async fn discovery_retries_5xx_then_succeeds() {
    let server = MockServer::start().await;

    // Two server errors, then a good page. Mount order decides matching
    // priority, and the flaky mock expires after two hits.
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "total_pages": 1,
            "total_results": 1,
            "results": [{ "id": 7, "title": "Third Time Lucky", "genre_ids": [35, 18] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    let page = tmdb.discover_by_genre(35, 1).await.unwrap();
    assert_eq!(page.movies.len(), 1);
    assert_eq!(page.movies[0].id, 7);
    assert_eq!(page.movies[0].genre_ids, vec![35, 18]);
}

#[tokio::test]
async fn discovery_gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    let err = tmdb.discover_by_genre(35, 1).await.unwrap_err();
    assert!(matches!(err, TmdbError::Status { status, .. } if status.as_u16() == 500));
}

#[tokio::test]
async fn discovery_does_not_retry_4xx() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    let err = tmdb.discover_by_genre(35, 1).await.unwrap_err();
    assert!(matches!(err, TmdbError::Status { status, .. } if status.as_u16() == 401));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn discovery_forwards_genre_and_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("with_genres", "27"))
        .and(query_param("page", "3"))
        .and(query_param("include_adult", "false"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 3,
            "total_pages": 9,
            "total_results": 171,
            "results": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    let page = tmdb.discover_by_genre(27, 3).await.unwrap();
    assert_eq!(page.page, 3);
    assert_eq!(page.total_pages, 9);
    assert_eq!(page.total_results, 171);
}

#[tokio::test]
async fn details_are_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movie/42"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    assert!(tmdb.fetch_details(42).await.is_err());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    let err = tmdb.discover_by_genre(35, 1).await.unwrap_err();
    assert!(matches!(err, TmdbError::Decode { .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn genre_list_maps_ids_to_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [
                { "id": 28, "name": "Action" },
                { "id": 35, "name": "Comedy" }
            ]
        })))
        .mount(&server)
        .await;

    let tmdb = client(server.uri());
    let catalog = tmdb.fetch_genre_list().await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get(&28).map(String::as_str), Some("Action"));
}
