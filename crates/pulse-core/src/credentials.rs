//! Per-request provider credential bundles.
//!
//! Bundles are supplied by the caller for each aggregation and never stored.
//! `Debug` output redacts every secret.

use serde::Deserialize;

/// Instagram Graph API credentials.
#[derive(Clone, Deserialize)]
pub struct InstagramCredentials {
    pub user_id: String,
    pub access_token: String,
}

impl InstagramCredentials {
    #[must_use]
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }

    /// `true` when both the user id and the token are non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.access_token.trim().is_empty()
    }
}

impl std::fmt::Debug for InstagramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstagramCredentials")
            .field("user_id", &self.user_id)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

/// Bearer-token credentials for the social search API.
#[derive(Clone, Deserialize)]
pub struct SearchCredentials {
    pub bearer_token: String,
}

impl SearchCredentials {
    #[must_use]
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.bearer_token.trim().is_empty()
    }
}

impl std::fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("bearer_token", &"[redacted]")
            .finish()
    }
}
