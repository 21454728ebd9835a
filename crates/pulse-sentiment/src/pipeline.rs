//! Aggregation pipeline orchestration.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{AppConfig, InstagramCredentials, SearchCredentials};

use crate::error::AggregateError;
use crate::executor::{RateLimitedExecutor, RetryPolicy};
use crate::scorer::{LexiconScorer, SentimentScorer};
use crate::sources::{InstagramClient, InstagramFetch, SearchClient};
use crate::types::{
    AggregateReport, InstagramItem, Post, Provider, ScoredComment, SearchHit, SearchItem, Warning,
    WarningKind,
};

/// Scored in place of a missing caption.
pub const CAPTION_PLACEHOLDER: &str = "No caption available";

/// Inputs for one aggregation call. Credentials live only as long as this.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    pub instagram: Option<InstagramCredentials>,
    pub search: Option<SearchCredentials>,
    pub query: String,
    pub count: u32,
}

/// Orchestrates both fetchers and the scorer.
#[derive(Clone)]
pub struct Aggregator {
    instagram: InstagramClient,
    search: SearchClient,
    scorer: Arc<dyn SentimentScorer>,
    deadline: Duration,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("instagram", &self.instagram)
            .field("search", &self.search)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    #[must_use]
    pub fn new(
        instagram: InstagramClient,
        search: SearchClient,
        scorer: Arc<dyn SentimentScorer>,
    ) -> Self {
        Self {
            instagram,
            search,
            scorer,
            deadline: Duration::from_secs(120),
        }
    }

    /// Build the production aggregator from application config.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if the HTTP client cannot be built or a
    /// provider base URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, AggregateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;
        let executor = RateLimitedExecutor::new(RetryPolicy::from_config(config));

        let instagram =
            InstagramClient::new(client.clone(), &config.instagram_base_url, executor.clone())?
                .with_max_attempts(config.instagram_max_attempts)
                .with_comment_concurrency(config.comment_concurrency);
        let search = SearchClient::new(client, &config.search_base_url, executor)?
            .with_max_attempts(config.search_max_attempts);

        Ok(Self::new(instagram, search, Arc::new(LexiconScorer))
            .with_deadline(Duration::from_secs(config.aggregate_deadline_secs)))
    }

    /// Overall per-provider deadline; expiry counts as that provider's failure.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    #[must_use]
    pub fn instagram(&self) -> &InstagramClient {
        &self.instagram
    }

    /// Run both providers concurrently and merge the scored results.
    ///
    /// Never fails: a provider that errors or times out contributes one
    /// warning and no items. A provider without complete credentials is
    /// skipped silently.
    pub async fn aggregate(&self, request: &AggregateRequest) -> AggregateReport {
        let ((instagram_items, mut instagram_warnings), (search_items, search_warnings)) = tokio::join!(
            self.instagram_branch(request.instagram.as_ref()),
            self.search_branch(request.search.as_ref(), &request.query, request.count),
        );

        for warning in instagram_warnings.iter().chain(&search_warnings) {
            tracing::warn!(
                provider = %warning.provider,
                kind = ?warning.kind,
                message = %warning.message,
                "aggregation warning"
            );
        }

        instagram_warnings.extend(search_warnings);
        AggregateReport {
            instagram_items,
            search_items,
            warnings: instagram_warnings,
        }
    }

    async fn instagram_branch(
        &self,
        creds: Option<&InstagramCredentials>,
    ) -> (Vec<InstagramItem>, Vec<Warning>) {
        let Some(creds) = creds.filter(|c| c.is_complete()) else {
            return (Vec::new(), Vec::new());
        };

        match tokio::time::timeout(self.deadline, self.instagram.fetch(creds)).await {
            Ok(Ok(InstagramFetch { posts, warnings })) => {
                let items = posts.iter().map(|post| self.score_post(post)).collect();
                (items, warnings)
            }
            Ok(Err(err)) => (
                Vec::new(),
                vec![Warning::from_fetch_error(Provider::Instagram, &err)],
            ),
            Err(_) => (Vec::new(), vec![self.timeout_warning(Provider::Instagram)]),
        }
    }

    async fn search_branch(
        &self,
        creds: Option<&SearchCredentials>,
        query: &str,
        count: u32,
    ) -> (Vec<SearchItem>, Vec<Warning>) {
        let Some(creds) = creds.filter(|c| c.is_complete()) else {
            return (Vec::new(), Vec::new());
        };

        match tokio::time::timeout(self.deadline, self.search.search(creds, query, count)).await {
            Ok(Ok(hits)) if hits.is_empty() => (
                Vec::new(),
                vec![Warning::new(
                    Provider::Search,
                    WarningKind::NoResults,
                    "No results found for the given search criteria",
                )],
            ),
            Ok(Ok(hits)) => (
                hits.into_iter()
                    .filter(|hit| !hit.text.trim().is_empty())
                    .map(|hit| self.score_hit(hit))
                    .collect(),
                Vec::new(),
            ),
            Ok(Err(err)) => (
                Vec::new(),
                vec![Warning::from_fetch_error(Provider::Search, &err)],
            ),
            Err(_) => (Vec::new(), vec![self.timeout_warning(Provider::Search)]),
        }
    }

    fn score_post(&self, post: &Post) -> InstagramItem {
        let caption = post
            .caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(CAPTION_PLACEHOLDER)
            .to_string();
        let caption_sentiment = self.scorer.score(&caption);

        let comments = post
            .comments
            .iter()
            .filter_map(|c| c.text.as_deref())
            .filter(|text| !text.trim().is_empty())
            .map(|text| ScoredComment {
                text: text.to_string(),
                sentiment: self.scorer.score(text),
            })
            .collect();

        InstagramItem {
            media_url: post.media_url.clone(),
            media_type: post.media_type.clone(),
            caption,
            caption_sentiment,
            comments,
        }
    }

    fn score_hit(&self, hit: SearchHit) -> SearchItem {
        let sentiment = self.scorer.score(&hit.text);
        SearchItem {
            text: hit.text,
            author: hit.author,
            username: hit.username,
            profile_image: hit.profile_image,
            created_at: hit.created_at,
            sentiment,
            sentiment_label: sentiment.label(),
        }
    }

    fn timeout_warning(&self, provider: Provider) -> Warning {
        Warning::new(
            provider,
            WarningKind::Timeout,
            format!(
                "{provider} fetch abandoned after {}s deadline",
                self.deadline.as_secs()
            ),
        )
    }
}
