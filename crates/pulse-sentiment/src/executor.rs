//! Rate-limit aware request execution with bounded retry.
//!
//! [`RateLimitedExecutor::execute`] sends a request built by the caller and
//! classifies the outcome:
//!
//! | Outcome              | Action                                              |
//! |----------------------|-----------------------------------------------------|
//! | transport error      | sleep `base + attempt × step`, retry                |
//! | `429`                | sleep `max(reset − now, min_wait) + attempt × jitter`, retry |
//! | `401`                | [`FetchError::Auth`], no retry                      |
//! | any other non-200    | [`FetchError::Api`], no retry                       |
//! | `200`                | decode the JSON body                                |
//!
//! Every sleep is capped at `max_wait`, the loop never runs more than
//! `max_attempts` times, and no sleep follows the final attempt.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use reqwest::{header::HeaderMap, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Header carrying the epoch second at which the rate-limit window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

const AUTH_REJECTED: &str = "credentials were rejected (HTTP 401); please update your credentials";

/// Time source and suspension point used between attempts.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Wall clock backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Wait schedule for transient failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub network_backoff_base: Duration,
    pub network_backoff_step: Duration,
    pub rate_limit_min_wait: Duration,
    pub rate_limit_jitter: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            network_backoff_base: Duration::from_secs(10),
            network_backoff_step: Duration::from_secs(5),
            rate_limit_min_wait: Duration::from_secs(10),
            rate_limit_jitter: Duration::from_secs(5),
            max_wait: Duration::from_secs(900),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &pulse_core::AppConfig) -> Self {
        Self {
            network_backoff_base: Duration::from_secs(config.network_backoff_base_secs),
            network_backoff_step: Duration::from_secs(config.network_backoff_step_secs),
            rate_limit_min_wait: Duration::from_secs(config.rate_limit_min_wait_secs),
            rate_limit_jitter: Duration::from_secs(config.rate_limit_jitter_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }

    /// Delay after the transport failure on zero-based `attempt`.
    #[must_use]
    pub fn network_delay(&self, attempt: u32) -> Duration {
        let delay = self
            .network_backoff_base
            .saturating_add(self.network_backoff_step.saturating_mul(attempt));
        delay.min(self.max_wait)
    }

    /// Delay after a 429 on zero-based `attempt`.
    ///
    /// A missing or already-passed reset time falls back to the minimum wait.
    #[must_use]
    pub fn rate_limit_delay(&self, reset_epoch: Option<i64>, now_epoch: i64, attempt: u32) -> Duration {
        let until_reset = reset_epoch
            .map(|reset| reset.saturating_sub(now_epoch))
            .and_then(|secs| u64::try_from(secs).ok())
            .map_or(Duration::ZERO, Duration::from_secs);
        let delay = until_reset
            .max(self.rate_limit_min_wait)
            .saturating_add(self.rate_limit_jitter.saturating_mul(attempt));
        delay.min(self.max_wait)
    }
}

/// Retry wrapper for providers with explicit rate-limit signalling.
#[derive(Clone)]
pub struct RateLimitedExecutor {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimitedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RateLimitedExecutor {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_clock(policy, Arc::new(TokioClock))
    }

    #[must_use]
    pub fn with_clock(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send the request produced by `build` up to `max_attempts` times.
    ///
    /// `build` is called once per attempt. A `max_attempts` of zero is
    /// treated as one.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] with the last transport error once attempts run out.
    /// - [`FetchError::RateLimited`] when every attempt was answered with 429.
    /// - [`FetchError::Auth`] on 401, [`FetchError::Api`] on any other non-200.
    /// - [`FetchError::Deserialize`] if a 200 body is not the expected JSON.
    pub async fn execute<T, F>(&self, build: F, max_attempts: u32) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            let is_last = attempt + 1 >= max_attempts;

            let response = match build().send().await {
                Ok(response) => response,
                Err(err) => {
                    if is_last {
                        return Err(FetchError::Network(err));
                    }
                    let delay = self.policy.network_delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_secs = delay.as_secs(),
                        error = %err,
                        "network error, retrying after back-off"
                    );
                    self.clock.sleep(delay).await;
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let reset = parse_reset_header(response.headers());
                let delay =
                    self.policy
                        .rate_limit_delay(reset, self.clock.now().timestamp(), attempt);
                if is_last {
                    return Err(FetchError::RateLimited {
                        attempts: max_attempts,
                        retry_after_secs: delay.as_secs(),
                    });
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    "rate limit reached, waiting for reset"
                );
                self.clock.sleep(delay).await;
                attempt += 1;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED {
                return Err(FetchError::Auth(AUTH_REJECTED.to_string()));
            }

            if status != StatusCode::OK {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let context = response.url().path().to_string();
            let body = response.text().await?;
            return serde_json::from_str(&body)
                .map_err(|source| FetchError::Deserialize { context, source });
        }
    }
}

fn parse_reset_header(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
}
