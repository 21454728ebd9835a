use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Polarity scores for one unit of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Normalized overall polarity in `[-1.0, 1.0]`.
    pub compound: f64,
    #[serde(rename = "pos")]
    pub positive: f64,
    #[serde(rename = "neu")]
    pub neutral: f64,
    #[serde(rename = "neg")]
    pub negative: f64,
}

impl SentimentScore {
    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Compound threshold above which text is positive (and below whose
    /// negation it is negative). The boundary itself is neutral.
    pub const THRESHOLD: f64 = 0.05;

    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound > Self::THRESHOLD {
            Self::Positive
        } else if compound < -Self::THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Display form used by the text renderers.
    #[must_use]
    pub fn decorated(self) -> &'static str {
        match self {
            Self::Positive => "Positive \u{1F60A}",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative \u{1F621}",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Negative => write!(f, "Negative"),
        }
    }
}

/// An Instagram media object with its comments attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub comments_count: u64,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, rename = "username")]
    pub author: Option<String>,
}

/// One hit from the recent-search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// A search result joined against its author.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub created_at: String,
    pub author: String,
    pub username: String,
    pub profile_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredComment {
    pub text: String,
    pub sentiment: SentimentScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstagramItem {
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub caption: String,
    pub caption_sentiment: SentimentScore,
    pub comments: Vec<ScoredComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    pub text: String,
    pub author: String,
    pub username: String,
    pub profile_image: String,
    pub created_at: String,
    pub sentiment: SentimentScore,
    pub sentiment_label: SentimentLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Instagram,
    Search,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instagram => write!(f, "instagram"),
            Self::Search => write!(f, "search"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Network,
    RateLimited,
    Auth,
    Api,
    Timeout,
    /// A post's comment fetch failed outright.
    CommentsUnavailable,
    /// A post reports comments but the API returned none (missing permission).
    CommentsWithheld,
    /// The provider answered successfully with zero results.
    NoResults,
}

impl WarningKind {
    /// Data came back, but incomplete.
    #[must_use]
    pub fn is_partial_data(self) -> bool {
        matches!(self, Self::CommentsUnavailable | Self::CommentsWithheld)
    }

    /// Informational notices that do not indicate degraded data.
    #[must_use]
    pub fn is_informational(self) -> bool {
        matches!(self, Self::NoResults)
    }
}

/// A non-fatal, user-visible note about partial or degraded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub provider: Provider,
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(provider: Provider, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            message: message.into(),
        }
    }

    /// Convert a provider-level failure into the warning reported for it.
    #[must_use]
    pub fn from_fetch_error(provider: Provider, error: &FetchError) -> Self {
        let kind = match error {
            FetchError::Network(_) => WarningKind::Network,
            FetchError::RateLimited { .. } => WarningKind::RateLimited,
            FetchError::Auth(_) => WarningKind::Auth,
            FetchError::Api { .. } | FetchError::Deserialize { .. } => WarningKind::Api,
        };
        Self::new(provider, kind, error.to_string())
    }
}

/// The merged output of one aggregation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub instagram_items: Vec<InstagramItem>,
    pub search_items: Vec<SearchItem>,
    pub warnings: Vec<Warning>,
}

impl AggregateReport {
    /// "Nothing to show": neither provider produced an item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instagram_items.is_empty() && self.search_items.is_empty()
    }

    pub fn warnings_for(&self, provider: Provider) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.provider == provider)
    }
}
