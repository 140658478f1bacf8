//! Idempotent persistent store with a synchronized full-text index.
//!
//! One primary `news` table keyed by `(topic, title)`, a `metadata`
//! key-value table, and an FTS5 shadow index over title/content/summary.
//! The index is maintained by triggers, so it moves in the same transaction
//! as every write to the primary table — no read can observe one without
//! the other. The database runs in WAL mode so searches keep working while
//! an ingestion pass writes.

use crate::discovery::parse_published;
use crate::types::{IngestError, NewsItem, Result};
use chrono::{DateTime, Datelike, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        topic TEXT NOT NULL,
        title TEXT NOT NULL,
        link TEXT NOT NULL DEFAULT '',
        published TEXT NOT NULL DEFAULT '',
        summary TEXT NOT NULL DEFAULT '',
        full_content TEXT NOT NULL,
        source TEXT NOT NULL DEFAULT '',
        image_url TEXT,
        sentiment TEXT,
        created_at TEXT NOT NULL,
        UNIQUE(topic, title)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS news_fts USING fts5(
        title, full_content, summary,
        content='news', content_rowid='id'
    )
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS news_fts_insert AFTER INSERT ON news BEGIN
        INSERT INTO news_fts(rowid, title, full_content, summary)
        VALUES (new.id, new.title, new.full_content, new.summary);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS news_fts_delete AFTER DELETE ON news BEGIN
        INSERT INTO news_fts(news_fts, rowid, title, full_content, summary)
        VALUES ('delete', old.id, old.title, old.full_content, old.summary);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS news_fts_update AFTER UPDATE ON news BEGIN
        INSERT INTO news_fts(news_fts, rowid, title, full_content, summary)
        VALUES ('delete', old.id, old.title, old.full_content, old.summary);
        INSERT INTO news_fts(rowid, title, full_content, summary)
        VALUES (new.id, new.title, new.full_content, new.summary);
    END
    "#,
];

const ITEM_COLUMNS: &str =
    "topic, title, link, published, summary, full_content, source, image_url, sentiment";

pub struct NewsStore {
    db: Pool<Sqlite>,
}

impl NewsStore {
    /// Open (creating if needed) the store at `path`, in WAL mode.
    pub async fn open(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps the database
    /// alive for the pool's lifetime.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.db).await?;
        }
        Ok(())
    }

    /// Bulk idempotent upsert. A duplicate `(topic, title)` is silently
    /// skipped, never an error and never an update — stored rows are
    /// immutable. Returns the number of rows actually inserted.
    pub async fn upsert_batch(&self, items: &[NewsItem]) -> Result<usize> {
        let mut tx = self.db.begin().await?;
        let now = Utc::now().to_rfc3339();
        let mut inserted = 0usize;

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT INTO news (topic, title, link, published, summary, full_content,
                                  source, image_url, sentiment, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(topic, title) DO NOTHING
                "#,
            )
            .bind(&item.topic)
            .bind(&item.title)
            .bind(&item.link)
            .bind(&item.published)
            .bind(&item.summary)
            .bind(&item.full_content)
            .bind(&item.source)
            .bind(&item.image_url)
            .bind(&item.sentiment)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        debug!(total = items.len(), inserted, "batch upsert complete");
        Ok(inserted)
    }

    /// All items for a topic, newest first by the leniently-parsed
    /// `published` timestamp; items without a parseable timestamp sort
    /// last, newest insertion first.
    pub async fn list_by_topic(&self, topic: &str) -> Result<Vec<NewsItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, created_at FROM news WHERE topic = ?",
            ITEM_COLUMNS
        ))
        .bind(topic)
        .fetch_all(&self.db)
        .await?;

        let mut keyed: Vec<(Option<DateTime<Utc>>, String, NewsItem)> = rows
            .iter()
            .map(|row| {
                let item = row_to_item(row)?;
                let created_at: String = row.try_get("created_at")?;
                Ok((parse_published(&item.published), created_at, item))
            })
            .collect::<Result<_>>()?;

        keyed.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.1.cmp(&a.1),
        });

        Ok(keyed.into_iter().map(|(_, _, item)| item).collect())
    }

    /// Full-text search over title + content + summary, optionally scoped
    /// to one topic, ranked by relevance.
    pub async fn search(
        &self,
        query: &str,
        topic: Option<&str>,
        limit: usize,
    ) -> Result<Vec<NewsItem>> {
        let fts_query = fts_escape(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM news_fts
            JOIN news n ON n.id = news_fts.rowid
            WHERE news_fts MATCH ?
              AND (? IS NULL OR n.topic = ?)
            ORDER BY bm25(news_fts)
            LIMIT ?
            "#,
            item_columns_prefixed("n")
        ))
        .bind(&fts_query)
        .bind(topic)
        .bind(topic)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    /// Paginated listing for one topic, optionally filtered to a year and
    /// month of the published timestamp. Returns the page plus the total
    /// count after filtering. Items whose timestamp cannot be parsed are
    /// excluded whenever a year filter is in effect.
    pub async fn list_page(
        &self,
        topic: &str,
        year: Option<i32>,
        month: Option<u32>,
        page: usize,
        per_page: usize,
    ) -> Result<(Vec<NewsItem>, usize)> {
        let items = self.list_by_topic(topic).await?;

        let filtered: Vec<NewsItem> = items
            .into_iter()
            .filter(|item| match year {
                None => true,
                Some(y) => match parse_published(&item.published) {
                    Some(dt) => dt.year() == y && month.map_or(true, |m| dt.month() == m),
                    None => false,
                },
            })
            .collect();

        let total = filtered.len();
        let start = page.saturating_mul(per_page);
        let page_items = filtered
            .into_iter()
            .skip(start)
            .take(per_page)
            .collect();

        Ok((page_items, total))
    }

    pub async fn count_items(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(&self.db)
            .await?)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.count_items().await? == 0)
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO metadata (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        row.map(|r| r.try_get::<String, _>("value").map_err(IngestError::from))
            .transpose()
    }

    /// Record the time of a successful ingestion pass.
    pub async fn record_ingestion(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_meta("last_updated", &at.format("%Y-%m-%d %H:%M:%S").to_string())
            .await
    }

    /// One-time import of a legacy flat snapshot (topic -> list of records,
    /// plus `_`-prefixed bookkeeping strings). Runs only while the store is
    /// empty; each record is strictly validated and discarded with a logged
    /// reason when malformed — no untyped value reaches the store.
    pub async fn import_legacy_snapshot(&self, path: &Path) -> Result<usize> {
        if !self.is_empty().await? {
            debug!("store is not empty, skipping legacy import");
            return Ok(0);
        }

        let raw = std::fs::read_to_string(path)?;
        let snapshot: serde_json::Value = serde_json::from_str(&raw)?;
        let map = snapshot
            .as_object()
            .ok_or_else(|| IngestError::Parse("legacy snapshot is not an object".to_string()))?;

        let mut imported = 0usize;

        for (key, value) in map {
            if let Some(meta_key) = key.strip_prefix('_') {
                if let Some(s) = value.as_str() {
                    self.set_meta(meta_key, s).await?;
                } else {
                    warn!(key = %key, "discarding non-string legacy metadata");
                }
                continue;
            }

            let Some(records) = value.as_array() else {
                warn!(topic = %key, "discarding legacy topic: not a list");
                continue;
            };

            let mut batch = Vec::with_capacity(records.len());
            for (index, record) in records.iter().enumerate() {
                match legacy_record_to_item(key, record) {
                    Ok(item) => batch.push(item),
                    Err(reason) => {
                        warn!(topic = %key, index, reason, "discarding legacy record")
                    }
                }
            }
            imported += self.upsert_batch(&batch).await?;
        }

        info!(imported, path = %path.display(), "legacy snapshot imported");
        Ok(imported)
    }
}

/// Convert one legacy record into a validated item, or say why not.
/// Historical snapshots mix full objects with bare strings; only objects
/// with a usable title survive.
fn legacy_record_to_item(
    topic: &str,
    record: &serde_json::Value,
) -> std::result::Result<NewsItem, &'static str> {
    let obj = record.as_object().ok_or("record is not an object")?;

    let text = |field: &str| -> String {
        obj.get(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    let title = text("title");
    if title.is_empty() {
        return Err("record has no title");
    }

    let link = text("link");
    let original_link = {
        let original = text("original_link");
        if original.is_empty() {
            link.clone()
        } else {
            original
        }
    };
    let full_content = {
        let content = text("full_content");
        if content.is_empty() {
            title.clone()
        } else {
            content
        }
    };
    let source = {
        let source = text("source");
        if source.is_empty() {
            "archive".to_string()
        } else {
            source
        }
    };
    let image_url = {
        let image = text("image");
        let image = if image.is_empty() { text("image_url") } else { image };
        if image.is_empty() { None } else { Some(image) }
    };
    let sentiment = {
        let s = text("sentiment");
        if s.is_empty() { None } else { Some(s) }
    };

    Ok(NewsItem {
        topic: topic.to_string(),
        title,
        link,
        original_link,
        published: text("published"),
        summary: text("summary"),
        full_content,
        source,
        image_url,
        sentiment,
    })
}

fn row_to_item(row: &SqliteRow) -> Result<NewsItem> {
    let link: String = row.try_get("link")?;
    Ok(NewsItem {
        topic: row.try_get("topic")?,
        title: row.try_get("title")?,
        original_link: link.clone(),
        link,
        published: row.try_get("published")?,
        summary: row.try_get("summary")?,
        full_content: row.try_get("full_content")?,
        source: row.try_get("source")?,
        image_url: row.try_get("image_url")?,
        sentiment: row.try_get("sentiment")?,
    })
}

fn item_columns_prefixed(alias: &str) -> String {
    ITEM_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote each term so user input can never be parsed as FTS5 syntax.
fn fts_escape(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}
