//! End-to-end aggregation tests against a wiremock server standing in for
//! both providers.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulse_core::{InstagramCredentials, SearchCredentials};
use pulse_sentiment::{
    AggregateRequest, Provider, SentimentLabel, SentimentScore, SentimentScorer, WarningKind,
    CAPTION_PLACEHOLDER,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{aggregator, aggregator_with_scorer};

const SEARCH_PATH: &str = "/2/tweets/search/recent";

fn request(
    instagram: Option<InstagramCredentials>,
    search: Option<SearchCredentials>,
) -> AggregateRequest {
    AggregateRequest {
        instagram,
        search,
        query: "AI".to_string(),
        count: 10,
    }
}

fn ig_creds() -> Option<InstagramCredentials> {
    Some(InstagramCredentials::new("1784", "ig-token"))
}

fn search_creds() -> Option<SearchCredentials> {
    Some(SearchCredentials::new("bearer-abc"))
}

fn three_results() -> serde_json::Value {
    serde_json::json!({
        "data": [
            { "text": "I love this model", "author_id": "u1", "created_at": "2026-10-18T01:00:00.000Z" },
            { "text": "worst release ever", "author_id": "u2", "created_at": "2026-10-18T02:00:00.000Z" },
            { "text": "shipping on tuesday", "author_id": "u1", "created_at": "2026-10-18T03:00:00.000Z" }
        ],
        "includes": { "users": [
            { "id": "u1", "name": "Ada", "username": "ada" },
            { "id": "u2", "name": "Grace", "username": "grace" }
        ] }
    })
}

/// Counts calls and returns a fixed score.
#[derive(Default)]
struct CountingScorer {
    calls: AtomicUsize,
}

impl SentimentScorer for CountingScorer {
    fn score(&self, _text: &str) -> SentimentScore {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SentimentScore {
            compound: 0.5,
            positive: 0.5,
            neutral: 0.5,
            negative: 0.0,
        }
    }
}

#[tokio::test]
async fn absent_credentials_skip_providers_silently() {
    let server = MockServer::start().await;

    let report = aggregator(&server.uri())
        .aggregate(&request(None, None))
        .await;

    assert!(report.is_empty());
    assert!(report.warnings.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn incomplete_credentials_count_as_absent() {
    let server = MockServer::start().await;

    let report = aggregator(&server.uri())
        .aggregate(&request(
            Some(InstagramCredentials::new("1784", "")),
            Some(SearchCredentials::new("  ")),
        ))
        .await;

    assert!(report.is_empty());
    assert!(report.warnings.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn instagram_failure_does_not_affect_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1784/media"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .mount(&server)
        .await;

    let report = aggregator(&server.uri())
        .aggregate(&request(ig_creds(), search_creds()))
        .await;

    assert!(report.instagram_items.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].provider, Provider::Instagram);
    assert_eq!(report.warnings[0].kind, WarningKind::Api);

    let texts: Vec<&str> = report.search_items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(
        texts,
        ["I love this model", "worst release ever", "shipping on tuesday"]
    );
    assert_eq!(report.search_items[0].author, "Ada");
    assert_eq!(report.search_items[1].username, "grace");
    assert_eq!(report.search_items[0].sentiment_label, SentimentLabel::Positive);
    assert_eq!(report.search_items[1].sentiment_label, SentimentLabel::Negative);
    assert_eq!(report.search_items[2].sentiment_label, SentimentLabel::Neutral);
}

#[tokio::test]
async fn search_auth_failure_keeps_instagram_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1784/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [ { "id": "p1", "caption": "great sunset", "media_type": "IMAGE" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let report = aggregator(&server.uri())
        .aggregate(&request(ig_creds(), search_creds()))
        .await;

    assert_eq!(report.instagram_items.len(), 1);
    assert_eq!(report.instagram_items[0].caption, "great sunset");
    assert!(report.search_items.is_empty());

    let search_warnings: Vec<_> = report.warnings_for(Provider::Search).collect();
    assert_eq!(search_warnings.len(), 1);
    assert_eq!(search_warnings[0].kind, WarningKind::Auth);
    assert!(search_warnings[0].message.contains("update your credentials"));
}

#[tokio::test]
async fn missing_caption_uses_placeholder_and_blank_comments_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1784/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "id": "p1", "media_url": "https://cdn/p1.jpg", "media_type": "IMAGE", "comments_count": 3 },
                { "id": "p2", "caption": "   ", "comments_count": 0 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "id": "c1", "text": "so good" },
                { "id": "c2", "text": "" },
                { "id": "c3" }
            ]
        })))
        .mount(&server)
        .await;

    let scorer = Arc::new(CountingScorer::default());
    let report = aggregator_with_scorer(&server.uri(), Arc::clone(&scorer) as Arc<dyn SentimentScorer>)
        .aggregate(&request(ig_creds(), None))
        .await;

    assert_eq!(report.instagram_items.len(), 2);
    let first = &report.instagram_items[0];
    assert_eq!(first.caption, CAPTION_PLACEHOLDER);
    assert_eq!(first.media_url.as_deref(), Some("https://cdn/p1.jpg"));
    assert_eq!(first.comments.len(), 1);
    assert_eq!(first.comments[0].text, "so good");
    assert_eq!(report.instagram_items[1].caption, CAPTION_PLACEHOLDER);

    // Two captions plus one non-blank comment.
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 3);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn every_text_unit_is_scored_exactly_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1784/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [ { "id": "p1", "caption": "hello", "comments_count": 2 } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [ { "id": "c1", "text": "first" }, { "id": "c2", "text": "second" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .mount(&server)
        .await;

    let scorer = Arc::new(CountingScorer::default());
    let report = aggregator_with_scorer(&server.uri(), Arc::clone(&scorer) as Arc<dyn SentimentScorer>)
        .aggregate(&request(ig_creds(), search_creds()))
        .await;

    assert_eq!(report.instagram_items.len(), 1);
    assert_eq!(report.search_items.len(), 3);
    // 1 caption + 2 comments + 3 search results.
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 6);
    let comments: Vec<&str> = report.instagram_items[0]
        .comments
        .iter()
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(comments, ["first", "second"]);
}

#[tokio::test]
async fn blank_search_texts_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "text": "great launch", "author_id": "u1" },
                { "text": "   ", "author_id": "u1" },
                { "author_id": "u1" },
                { "text": "awful bugs", "author_id": "u1" }
            ]
        })))
        .mount(&server)
        .await;

    let scorer = Arc::new(CountingScorer::default());
    let report = aggregator_with_scorer(&server.uri(), Arc::clone(&scorer) as Arc<dyn SentimentScorer>)
        .aggregate(&request(None, search_creds()))
        .await;

    let texts: Vec<&str> = report.search_items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, ["great launch", "awful bugs"]);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn empty_search_is_a_notice_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "meta": { "result_count": 0 } })),
        )
        .mount(&server)
        .await;

    let report = aggregator(&server.uri())
        .aggregate(&request(None, search_creds()))
        .await;

    assert!(report.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::NoResults);
    assert!(report.warnings[0].kind.is_informational());
}

#[tokio::test]
async fn slow_provider_is_abandoned_at_deadline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1784/media"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .mount(&server)
        .await;

    let report = aggregator(&server.uri())
        .with_deadline(Duration::from_millis(200))
        .aggregate(&request(ig_creds(), search_creds()))
        .await;

    assert!(report.instagram_items.is_empty());
    assert_eq!(report.search_items.len(), 3);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].provider, Provider::Instagram);
    assert_eq!(report.warnings[0].kind, WarningKind::Timeout);
}

#[tokio::test]
async fn report_serializes_for_presentation_layers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_results()))
        .mount(&server)
        .await;

    let report = aggregator(&server.uri())
        .aggregate(&request(None, search_creds()))
        .await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["search_items"].as_array().unwrap().len(), 3);
    assert_eq!(json["search_items"][0]["sentiment_label"], "Positive");
    assert!(json["search_items"][0]["sentiment"]["compound"].is_number());
    assert!(json["instagram_items"].as_array().unwrap().is_empty());
}
