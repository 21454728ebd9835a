//! Provider fetchers.

mod instagram;
mod search;

pub use instagram::{CredentialCheck, InstagramClient, InstagramFetch, COMMENT_PERMISSION};
pub use search::{SearchClient, SEARCH_AUTH_MESSAGE};

use reqwest::Url;

use crate::error::AggregateError;

/// Parse a provider base URL, normalised to end with exactly one slash.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, AggregateError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    let url = Url::parse(&normalised).map_err(|e| AggregateError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(AggregateError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: "URL cannot carry a path".to_string(),
        });
    }
    Ok(url)
}

/// Append `segments` to `base` and attach `params` as query pairs.
pub(crate) fn endpoint(base: &Url, segments: &[&str], params: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    url
}
