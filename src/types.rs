use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single resolved news article, keyed by `(topic, title)`.
///
/// `full_content` is never empty: the resolver guarantees a non-empty body,
/// falling back to the title itself when every extraction tier fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Ingestion category this item belongs to (company, sector, theme).
    pub topic: String,
    pub title: String,
    /// Best-effort canonical publisher link.
    pub link: String,
    /// The aggregator redirect link exactly as it appeared in the feed.
    pub original_link: String,
    /// Free-form timestamp string from the feed; parsed leniently downstream.
    pub published: String,
    pub summary: String,
    pub full_content: String,
    /// Which extraction tier/portal produced `full_content`.
    pub source: String,
    pub image_url: Option<String>,
    pub sentiment: Option<String>,
}

impl NewsItem {
    /// Length of the article body in characters, used by the deduplicator
    /// to rank near-duplicates.
    pub fn content_len(&self) -> usize {
        self.full_content.chars().count()
    }
}

/// A raw candidate entry pulled from the search feed, before resolution.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Raw timestamp string as rendered from the feed entry (may be empty).
    pub published: String,
    /// Parsed timestamp when the feed provided a usable one.
    pub published_at: Option<DateTime<Utc>>,
}

/// Result of one discovery pass for a topic.
#[derive(Debug, Clone)]
pub struct DiscoveredBatch {
    pub entries: Vec<FeedItem>,
    /// True when the entries came from the widened retry window and callers
    /// should warn users that freshness is reduced.
    pub reduced_freshness: bool,
}

/// Output of the content resolver for one article.
#[derive(Debug, Clone)]
pub struct ResolvedContent {
    /// Never empty; worst case equals the article title.
    pub content: String,
    pub summary: String,
    /// Name of the tier that produced the content.
    pub source: String,
    pub image_url: Option<String>,
    /// URL the content was actually read from, when a portal tier
    /// substituted its own copy of the article.
    pub final_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
