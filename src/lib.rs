pub mod config;
pub mod dedup;
pub mod discovery;
pub mod extract;
pub mod pipeline;
pub mod redirect;
pub mod sentiment;
pub mod store;
pub mod types;
pub mod validator;

pub use config::{AppConfig, DedupConfig, FetchConfig, TopicKind, TopicSpec, ValidatorConfig};
pub use dedup::Deduplicator;
pub use discovery::FeedDiscovery;
pub use extract::{ContentResolver, ExtractedContent, ExtractionTier};
pub use pipeline::{needs_refresh, NewsPipeline, RunReport};
pub use redirect::resolve_redirect;
pub use store::NewsStore;
pub use types::{DiscoveredBatch, FeedItem, IngestError, NewsItem, ResolvedContent, Result};
pub use validator::ContentValidator;
