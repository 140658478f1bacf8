//! End-to-end ingestion orchestration.
//!
//! Discovery and content resolution for different topics are independent
//! and I/O-bound, so they run on a bounded-concurrency stream. Within one
//! topic articles are resolved sequentially with a politeness delay.
//! Deduplication and store writes happen afterwards from a single merge
//! loop — the store is never mutated concurrently for one topic.
//!
//! No single-article failure aborts a batch, and no single-topic failure
//! aborts a run: partial results are the normal case.

use crate::config::{AppConfig, TopicSpec};
use crate::dedup::Deduplicator;
use crate::discovery::FeedDiscovery;
use crate::extract::ContentResolver;
use crate::redirect::resolve_redirect;
use crate::sentiment::tag_sentiment;
use crate::store::NewsStore;
use crate::types::{IngestError, NewsItem, Result};
use crate::validator::ContentValidator;
use chrono::{NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, warn};

/// Outcome summary of one ingestion run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub topics: usize,
    pub fetched: usize,
    pub inserted: usize,
    pub failed_topics: Vec<String>,
    /// Topics whose results came from the widened fallback window.
    pub reduced_freshness: Vec<String>,
}

pub struct NewsPipeline {
    config: AppConfig,
    discovery: FeedDiscovery,
    resolver: ContentResolver,
    dedup: Deduplicator,
    store: NewsStore,
}

impl NewsPipeline {
    /// Wire up every component from one explicit configuration object.
    /// Also performs the one-time legacy snapshot import when the store is
    /// empty and a snapshot file is present.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.fetch.user_agent)
            .timeout(Duration::from_secs(config.fetch.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(IngestError::Http)?;

        let store = NewsStore::open(&config.db_path).await?;

        if store.is_empty().await? {
            if let Some(snapshot) = config.legacy_snapshot.as_ref().filter(|p| p.exists()) {
                info!(path = %snapshot.display(), "empty store, importing legacy snapshot");
                store.import_legacy_snapshot(snapshot).await?;
            }
        }

        let discovery = FeedDiscovery::new(client.clone(), config.fetch.clone());
        let resolver = ContentResolver::new(
            client,
            ContentValidator::new(config.validator.clone()),
        );
        let dedup = Deduplicator::new(config.dedup.clone());

        Ok(Self {
            config,
            discovery,
            resolver,
            dedup,
            store,
        })
    }

    pub fn store(&self) -> &NewsStore {
        &self.store
    }

    /// Fetch and resolve one topic's batch. Every entry yields an item —
    /// the resolver's terminal tier guarantees a non-empty body even when
    /// every extraction route fails.
    pub async fn ingest_topic(&self, topic: &TopicSpec) -> Result<(Vec<NewsItem>, bool)> {
        let batch = self
            .discovery
            .discover(topic, self.config.lookback_days, self.config.max_items)
            .await?;

        let mut items = Vec::with_capacity(batch.entries.len());
        let total = batch.entries.len();

        for entry in batch.entries {
            let canonical = resolve_redirect(&entry.link);
            let resolved = self.resolver.resolve(&canonical, &entry.title).await;

            let sentiment = tag_sentiment(&resolved.content);
            items.push(NewsItem {
                topic: topic.key.clone(),
                title: entry.title,
                link: resolved.final_url.unwrap_or(canonical),
                original_link: entry.link,
                published: entry.published,
                summary: resolved.summary,
                full_content: resolved.content,
                source: resolved.source,
                image_url: resolved.image_url,
                sentiment: Some(sentiment.to_string()),
            });

            // Politeness between article requests; skipped in fallback mode
            // to bound total latency of an already-degraded pass.
            if !batch.reduced_freshness {
                tokio::time::sleep(Duration::from_millis(
                    self.config.fetch.politeness_delay_ms,
                ))
                .await;
            }
        }

        info!(topic = %topic.key, resolved = items.len(), of = total, "topic batch resolved");
        Ok((items, batch.reduced_freshness))
    }

    /// One full ingestion pass over the configured topics.
    ///
    /// Topics are fetched in parallel under a concurrency bound; the merge
    /// with the stored archive, deduplication and the store write then run
    /// from this single task, one topic at a time.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport {
            topics: self.config.topics.len(),
            ..Default::default()
        };

        let fetched: Vec<(String, Result<(Vec<NewsItem>, bool)>)> =
            stream::iter(self.config.topics.iter())
                .map(|topic| async move { (topic.key.clone(), self.ingest_topic(topic).await) })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

        for (key, outcome) in fetched {
            let (fresh, reduced) = match outcome {
                Ok(result) => result,
                Err(e) => {
                    error!(topic = %key, error = %e, "topic ingestion failed, skipping");
                    report.failed_topics.push(key);
                    continue;
                }
            };

            if reduced {
                report.reduced_freshness.push(key.clone());
            }
            report.fetched += fresh.len();

            let archive = self.store.list_by_topic(&key).await?;
            let mut combined = fresh;
            combined.extend(archive);
            let unique = self.dedup.dedupe(combined);

            let inserted = self.store.upsert_batch(&unique).await?;
            report.inserted += inserted;
            info!(topic = %key, inserted, "topic merged into store");
        }

        self.store.record_ingestion(Utc::now()).await?;

        info!(
            topics = report.topics,
            fetched = report.fetched,
            inserted = report.inserted,
            failed = report.failed_topics.len(),
            "ingestion run complete"
        );
        Ok(report)
    }
}

/// True when no successful ingestion has been recorded today. Callers use
/// this to decide whether a scheduled pass is due; a missing or unreadable
/// timestamp counts as stale.
pub async fn needs_refresh(store: &NewsStore) -> Result<bool> {
    let Some(last_updated) = store.get_meta("last_updated").await? else {
        return Ok(true);
    };

    match NaiveDateTime::parse_from_str(&last_updated, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => Ok(dt.date() < Utc::now().date_naive()),
        Err(_) => {
            warn!(last_updated = %last_updated, "unparseable last_updated, forcing refresh");
            Ok(true)
        }
    }
}
