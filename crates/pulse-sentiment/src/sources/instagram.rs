//! Instagram Graph API fetcher.
//!
//! Two-level fetch: the user's media list first, then the comments of every
//! post that reports any. Comment fetches are independent; one failing post
//! degrades to an empty comment list plus a warning and never affects its
//! siblings.

use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use pulse_core::InstagramCredentials;

use crate::error::{AggregateError, FetchError};
use crate::executor::RateLimitedExecutor;
use crate::types::{Comment, Post, Provider, Warning, WarningKind};

use super::{endpoint, parse_base_url};

const MEDIA_FIELDS: &str = "id,caption,media_url,media_type,comments_count";
const COMMENT_FIELDS: &str = "id,text,timestamp,username";
const PROFILE_FIELDS: &str = "id,username";

/// Permission required to read comments on a Business/Creator account.
pub const COMMENT_PERMISSION: &str = "instagram_graph_manage_comments";

const INVALID_CREDENTIALS: &str =
    "Invalid Instagram credentials. Please check your User ID and Access Token.";

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MediaRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    caption: Option<String>,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    comments_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionGrant {
    permission: String,
    #[serde(default)]
    status: Option<String>,
}

enum CommentOutcome {
    NotRequested,
    Loaded(Vec<Comment>),
    Withheld,
    Failed(FetchError),
}

/// Posts with their comments attached, plus per-post degradation notes.
#[derive(Debug, Default)]
pub struct InstagramFetch {
    pub posts: Vec<Post>,
    pub warnings: Vec<Warning>,
}

/// Result of a credential verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialCheck {
    pub account_id: String,
    pub username: Option<String>,
    /// `None` when the permission listing itself could not be read.
    pub comment_permission: Option<bool>,
    pub warnings: Vec<Warning>,
}

/// Client for the Instagram Graph API.
#[derive(Debug, Clone)]
pub struct InstagramClient {
    client: Client,
    base_url: Url,
    executor: RateLimitedExecutor,
    max_attempts: u32,
    comment_concurrency: usize,
}

impl InstagramClient {
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
            max_attempts: 1,
            comment_concurrency: 4,
        })
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_comment_concurrency(mut self, limit: usize) -> Self {
        self.comment_concurrency = limit.max(1);
        self
    }

    /// Fetch the user's media list and each post's comments.
    ///
    /// Posts keep the order the API returned them in; so do comments.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] only when the media list itself cannot be
    /// fetched. Comment failures are reported as warnings in the result.
    pub async fn fetch(&self, creds: &InstagramCredentials) -> Result<InstagramFetch, FetchError> {
        let url = endpoint(
            &self.base_url,
            &[&creds.user_id, "media"],
            &[
                ("fields", MEDIA_FIELDS),
                ("access_token", &creds.access_token),
            ],
        );
        let media: Page<MediaRecord> = self
            .get(url)
            .await
            .map_err(|e| Self::classify_auth(e, INVALID_CREDENTIALS))?;

        tracing::debug!(
            provider = %Provider::Instagram,
            posts = media.data.len(),
            "fetched media list"
        );

        let token = creds.access_token.as_str();
        let outcomes: Vec<(MediaRecord, CommentOutcome)> = stream::iter(media.data)
            .map(|record| async move {
                let outcome = self.comments_for(&record, token).await;
                (record, outcome)
            })
            .buffered(self.comment_concurrency)
            .collect()
            .await;

        let mut fetch = InstagramFetch::default();
        for (record, outcome) in outcomes {
            let comments = match outcome {
                CommentOutcome::NotRequested => Vec::new(),
                CommentOutcome::Loaded(comments) => {
                    tracing::debug!(
                        post_id = %record.id,
                        count = comments.len(),
                        "fetched comments"
                    );
                    comments
                }
                CommentOutcome::Withheld => {
                    tracing::warn!(
                        post_id = %record.id,
                        expected = record.comments_count.unwrap_or_default(),
                        "post reports comments but none were returned"
                    );
                    fetch.warnings.push(Warning::new(
                        Provider::Instagram,
                        WarningKind::CommentsWithheld,
                        format!(
                            "Post {} has comments but none were returned. Check API permissions.",
                            record.id
                        ),
                    ));
                    Vec::new()
                }
                CommentOutcome::Failed(err) => {
                    tracing::warn!(post_id = %record.id, error = %err, "comment fetch failed");
                    let detail = match &err {
                        FetchError::Api { status, .. } => format!("Status code: {status}"),
                        other => other.to_string(),
                    };
                    fetch.warnings.push(Warning::new(
                        Provider::Instagram,
                        WarningKind::CommentsUnavailable,
                        format!("Error fetching comments for post {}. {detail}", record.id),
                    ));
                    Vec::new()
                }
            };

            fetch.posts.push(Post {
                id: record.id,
                caption: record.caption,
                media_url: record.media_url,
                media_type: record.media_type,
                comments_count: record.comments_count.unwrap_or_default(),
                comments,
            });
        }

        Ok(fetch)
    }

    /// Check that the token is valid and whether it can read comments.
    ///
    /// Meant for credential submission time, not the aggregation path.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Auth`] if the profile lookup is rejected, or a
    /// transient [`FetchError`] if the provider could not be reached. A failed
    /// permission listing is not an error; it leaves
    /// [`CredentialCheck::comment_permission`] unknown.
    pub async fn verify(&self, creds: &InstagramCredentials) -> Result<CredentialCheck, FetchError> {
        let url = endpoint(
            &self.base_url,
            &["me"],
            &[
                ("fields", PROFILE_FIELDS),
                ("access_token", &creds.access_token),
            ],
        );
        let profile: Profile = self.get(url).await.map_err(|e| match e {
            FetchError::Network(_) | FetchError::RateLimited { .. } => e,
            _ => FetchError::Auth(INVALID_CREDENTIALS.to_string()),
        })?;

        let url = endpoint(
            &self.base_url,
            &["me", "permissions"],
            &[("access_token", &creds.access_token)],
        );
        let comment_permission = match self.get::<Page<PermissionGrant>>(url).await {
            Ok(page) => Some(page.data.iter().any(|grant| {
                grant.permission == COMMENT_PERMISSION
                    && grant.status.as_deref().is_none_or(|s| s == "granted")
            })),
            Err(err) => {
                tracing::warn!(error = %err, "permission listing unavailable");
                None
            }
        };

        let mut warnings = Vec::new();
        if comment_permission == Some(false) {
            warnings.push(Warning::new(
                Provider::Instagram,
                WarningKind::Auth,
                format!(
                    "Your access token does not have permission to read comments. Please ensure \
                     your Instagram account is a Business or Creator account and that you have \
                     granted the \"{COMMENT_PERMISSION}\" permission."
                ),
            ));
        }

        Ok(CredentialCheck {
            account_id: profile.id,
            username: profile.username,
            comment_permission,
            warnings,
        })
    }

    async fn comments_for(&self, record: &MediaRecord, token: &str) -> CommentOutcome {
        if record.id.is_empty() || record.comments_count.unwrap_or_default() == 0 {
            return CommentOutcome::NotRequested;
        }

        let url = endpoint(
            &self.base_url,
            &[&record.id, "comments"],
            &[("fields", COMMENT_FIELDS), ("access_token", token)],
        );
        match self.get::<Page<Comment>>(url).await {
            Ok(page) if page.data.is_empty() => CommentOutcome::Withheld,
            Ok(page) => CommentOutcome::Loaded(page.data),
            Err(err) => CommentOutcome::Failed(err),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        self.executor
            .execute(|| self.client.get(url.clone()), self.max_attempts)
            .await
    }

    /// The Graph API reports bad tokens as `400 OAuthException` rather than 401.
    fn classify_auth(err: FetchError, message: &str) -> FetchError {
        match err {
            FetchError::Auth(_) => FetchError::Auth(message.to_string()),
            FetchError::Api { status: 400, ref body } if body.contains("OAuthException") => {
                FetchError::Auth(message.to_string())
            }
            other => other,
        }
    }
}
