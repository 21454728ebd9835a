//! Integration tests for `SearchClient` using wiremock HTTP mocks.

mod common;

use std::time::Duration;

use pulse_core::SearchCredentials;
use pulse_sentiment::executor::RATE_LIMIT_RESET_HEADER;
use pulse_sentiment::sources::SEARCH_AUTH_MESSAGE;
use pulse_sentiment::FetchError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{search_client, START_EPOCH};

const SEARCH_PATH: &str = "/2/tweets/search/recent";

fn creds() -> SearchCredentials {
    SearchCredentials::new("bearer-abc")
}

#[tokio::test]
async fn search_sends_expected_params_and_joins_authors() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": [
            { "id": "1", "text": "Rust is great", "author_id": "u1",
              "created_at": "2026-10-18T09:00:00.000Z" },
            { "id": "2", "text": "who wrote this?", "author_id": "ghost",
              "created_at": "2026-10-18T09:05:00.000Z" }
        ],
        "includes": {
            "users": [
                { "id": "u1", "name": "Ferris", "username": "ferris",
                  "profile_image_url": "https://img.example/ferris.png" }
            ]
        },
        "meta": { "result_count": 2 }
    });

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("authorization", "Bearer bearer-abc"))
        .and(query_param("query", "rustlang"))
        .and(query_param("max_results", "25"))
        .and(query_param("tweet.fields", "text,created_at,author_id"))
        .and(query_param("expansions", "author_id"))
        .and(query_param("user.fields", "username,name,profile_image_url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let hits = client
        .search(&creds(), "rustlang", 25)
        .await
        .expect("search should succeed");

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].text, "Rust is great");
    assert_eq!(hits[0].author, "Ferris");
    assert_eq!(hits[0].username, "ferris");
    assert_eq!(hits[0].profile_image, "https://img.example/ferris.png");
    assert_eq!(hits[0].created_at, "2026-10-18T09:00:00.000Z");

    assert_eq!(hits[1].author, "Unknown");
    assert_eq!(hits[1].username, "");
}

#[tokio::test]
async fn count_below_provider_minimum_is_clamped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("max_results", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let hits = client.search(&creds(), "AI", 3).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn hits_are_cut_back_to_requested_count() {
    let server = MockServer::start().await;

    let data: Vec<serde_json::Value> = (0..10)
        .map(|i| serde_json::json!({ "id": i.to_string(), "text": format!("post {i}") }))
        .collect();

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("max_results", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": data })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let hits = client.search(&creds(), "AI", 5).await.unwrap();

    let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(texts, ["post 0", "post 1", "post 2", "post 3", "post 4"]);
}

#[tokio::test]
async fn count_above_provider_maximum_is_capped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("max_results", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [ { "text": "only one" } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let hits = client.search(&creds(), "AI", 500).await.unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn zero_results_is_empty_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "meta": { "result_count": 0 } })),
        )
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let hits = client.search(&creds(), "AI", 10).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn rejected_token_is_actionable_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, clock) = search_client(&server.uri());
    let result = client.search(&creds(), "AI", 10).await;

    match result {
        Err(FetchError::Auth(message)) => assert_eq!(message, SEARCH_AUTH_MESSAGE),
        other => panic!("expected Auth error, got {other:?}"),
    }
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn bad_query_surfaces_provider_message_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"title":"Invalid Request"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let err = client.search(&creds(), "", 10).await.unwrap_err();

    assert!(matches!(err, FetchError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), r#"API error 400: {"title":"Invalid Request"}"#);
}

#[tokio::test]
async fn errors_only_payload_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [ { "title": "Invalid Request", "detail": "query too long" } ]
        })))
        .mount(&server)
        .await;

    let (client, _) = search_client(&server.uri());
    let err = client.search(&creds(), "AI", 10).await.unwrap_err();
    assert!(
        matches!(err, FetchError::Api { status: 200, ref body } if body == "query too long"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn rate_limit_then_success_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header(RATE_LIMIT_RESET_HEADER, (START_EPOCH + 42).to_string()),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [ { "text": "back again", "author_id": "u1" } ]
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let (client, clock) = search_client(&server.uri());
    let hits = client.search(&creds(), "AI", 10).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(42)]);
}

#[tokio::test]
async fn persistent_rate_limit_stops_after_five_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(5)
        .mount(&server)
        .await;

    let (client, clock) = search_client(&server.uri());
    let result = client.search(&creds(), "AI", 10).await;

    assert!(matches!(
        result,
        Err(FetchError::RateLimited { attempts: 5, .. })
    ));
    assert_eq!(clock.sleeps().len(), 4);
}
