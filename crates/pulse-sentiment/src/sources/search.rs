//! Recent-search fetcher for the social search API (v2 `tweets/search/recent`).

use std::collections::HashMap;

use reqwest::{Client, Url};
use serde::Deserialize;

use pulse_core::SearchCredentials;

use crate::error::{AggregateError, FetchError};
use crate::executor::RateLimitedExecutor;
use crate::types::{AuthorProfile, SearchHit, SearchResult};

use super::{endpoint, parse_base_url};

const SEARCH_PATH: &[&str] = &["2", "tweets", "search", "recent"];
const RESULT_FIELDS: &str = "text,created_at,author_id";
const USER_FIELDS: &str = "username,name,profile_image_url";

/// The provider rejects `max_results` outside this range.
const MIN_RESULTS: u32 = 10;
const MAX_RESULTS: u32 = 100;

/// Shown when the bearer token is rejected.
pub const SEARCH_AUTH_MESSAGE: &str =
    "Invalid or expired Bearer Token. Please update your credentials.";

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    data: Vec<SearchResult>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    errors: Vec<ProblemDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<AuthorProfile>,
}

#[derive(Debug, Deserialize)]
struct ProblemDetail {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Client for the recent-search endpoint.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    base_url: Url,
    executor: RateLimitedExecutor,
    max_attempts: u32,
}

impl SearchClient {
    /// Creates a client against `base_url` (production or a mock server).
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        client: Client,
        base_url: &str,
        executor: RateLimitedExecutor,
    ) -> Result<Self, AggregateError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            executor,
            max_attempts: 5,
        })
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Search recent posts for `query`, joined against their authors.
    ///
    /// The provider is asked for at least its minimum page size; the hits are
    /// then cut back to `count`.
    ///
    /// An empty `Vec` means the search succeeded with zero results.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Auth`] with [`SEARCH_AUTH_MESSAGE`] if the token is rejected.
    /// - [`FetchError::Api`] if the provider rejects the query, including a
    ///   `200` that carries only an `errors` array.
    /// - [`FetchError::RateLimited`] / [`FetchError::Network`] once retries run out.
    pub async fn search(
        &self,
        creds: &SearchCredentials,
        query: &str,
        count: u32,
    ) -> Result<Vec<SearchHit>, FetchError> {
        if count > MAX_RESULTS {
            tracing::warn!(
                requested = count,
                max = MAX_RESULTS,
                "result count above provider maximum, capping"
            );
        }
        let max_results = count.clamp(MIN_RESULTS, MAX_RESULTS).to_string();
        let url = endpoint(
            &self.base_url,
            SEARCH_PATH,
            &[
                ("query", query),
                ("max_results", &max_results),
                ("tweet.fields", RESULT_FIELDS),
                ("expansions", "author_id"),
                ("user.fields", USER_FIELDS),
            ],
        );

        let envelope: SearchEnvelope = self
            .executor
            .execute(
                || {
                    self.client
                        .get(url.clone())
                        .bearer_auth(&creds.bearer_token)
                },
                self.max_attempts,
            )
            .await
            .map_err(|e| match e {
                FetchError::Auth(_) => FetchError::Auth(SEARCH_AUTH_MESSAGE.to_string()),
                other => other,
            })?;

        if envelope.data.is_empty() {
            if let Some(problem) = envelope.errors.first() {
                let body = problem
                    .detail
                    .as_deref()
                    .or(problem.title.as_deref())
                    .unwrap_or("unknown error")
                    .to_string();
                return Err(FetchError::Api { status: 200, body });
            }
        }

        let mut hits = join_authors(envelope.data, &envelope.includes.users);
        hits.truncate(usize::try_from(count).unwrap_or(usize::MAX));
        Ok(hits)
    }
}

/// Join each result to its author via `author_id`.
///
/// Results whose author is missing from the expansions get placeholder
/// fields instead of failing.
fn join_authors(results: Vec<SearchResult>, users: &[AuthorProfile]) -> Vec<SearchHit> {
    let by_id: HashMap<&str, &AuthorProfile> =
        users.iter().map(|u| (u.id.as_str(), u)).collect();

    results
        .into_iter()
        .map(|result| {
            let author = result
                .author_id
                .as_deref()
                .and_then(|id| by_id.get(id).copied());
            SearchHit {
                text: result.text,
                created_at: result.created_at.unwrap_or_default(),
                author: author
                    .and_then(|a| a.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                username: author.and_then(|a| a.username.clone()).unwrap_or_default(),
                profile_image: author
                    .and_then(|a| a.profile_image_url.clone())
                    .unwrap_or_default(),
            }
        })
        .collect()
}
