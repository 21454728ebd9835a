//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use pulse_sentiment::{
    Aggregator, Clock, InstagramClient, LexiconScorer, RateLimitedExecutor, RetryPolicy,
    SearchClient, SentimentScorer,
};

/// Epoch second the fake clock starts at.
pub const START_EPOCH: i64 = 1_700_000_000;

/// Clock that records requested sleeps and advances virtual time instead of
/// blocking.
#[derive(Debug, Default)]
pub struct RecordingClock {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed: Duration = self.slept.lock().unwrap().iter().sum();
        let start = DateTime::from_timestamp(START_EPOCH, 0).unwrap();
        start + chrono::TimeDelta::from_std(elapsed).unwrap()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.slept.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

pub fn executor(policy: RetryPolicy) -> (RateLimitedExecutor, Arc<RecordingClock>) {
    let clock = Arc::new(RecordingClock::default());
    let executor = RateLimitedExecutor::with_clock(policy, Arc::clone(&clock) as Arc<dyn Clock>);
    (executor, clock)
}

pub fn instagram_client(base_url: &str) -> InstagramClient {
    let (executor, _) = executor(RetryPolicy::default());
    InstagramClient::new(reqwest::Client::new(), base_url, executor)
        .expect("client construction should not fail")
}

pub fn search_client(base_url: &str) -> (SearchClient, Arc<RecordingClock>) {
    let (executor, clock) = executor(RetryPolicy::default());
    let client = SearchClient::new(reqwest::Client::new(), base_url, executor)
        .expect("client construction should not fail");
    (client, clock)
}

pub fn aggregator(base_url: &str) -> Aggregator {
    aggregator_with_scorer(base_url, Arc::new(LexiconScorer))
}

/// Both providers pointed at the same mock server; paths never collide.
pub fn aggregator_with_scorer(base_url: &str, scorer: Arc<dyn SentimentScorer>) -> Aggregator {
    let (search, _) = search_client(base_url);
    Aggregator::new(instagram_client(base_url), search, scorer)
}
