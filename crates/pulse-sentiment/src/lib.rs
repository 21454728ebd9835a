//! Sentiment aggregation pipeline.
//!
//! Pulls posts and comments from the Instagram Graph API and recent posts from
//! the social search API, scores every text unit with a lexicon scorer, and
//! merges both providers into one [`AggregateReport`]. A failing provider
//! degrades to a warning; it never aborts the other.

pub mod error;
pub mod executor;
pub mod pipeline;
pub mod scorer;
pub mod sources;
pub mod types;

pub use error::{AggregateError, FetchError};
pub use executor::{Clock, RateLimitedExecutor, RetryPolicy, TokioClock};
pub use pipeline::{AggregateRequest, Aggregator, CAPTION_PLACEHOLDER};
pub use scorer::{polarity_scores, LexiconScorer, SentimentScorer};
pub use sources::{CredentialCheck, InstagramClient, InstagramFetch, SearchClient};
pub use types::{
    AggregateReport, AuthorProfile, Comment, InstagramItem, Post, Provider, ScoredComment,
    SearchHit, SearchItem, SearchResult, SentimentLabel, SentimentScore, Warning, WarningKind,
};
