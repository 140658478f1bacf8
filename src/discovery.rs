//! Per-topic feed discovery against the search-style news feed.
//!
//! The backend's own relative-date operator (`when:Nd`) is imprecise, so a
//! strict client-side cutoff computed from each entry's own timestamp is
//! applied on top. Entries without a parseable timestamp pass through —
//! unknown is not proof of staleness.

use crate::config::{FetchConfig, TopicKind, TopicSpec};
use crate::types::{DiscoveredBatch, FeedItem, IngestError, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

/// Cap and window applied to the widened retry for sparse entity topics.
const FALLBACK_WINDOW_DAYS: i64 = 365;
const FALLBACK_MAX_ITEMS: usize = 3;

pub struct FeedDiscovery {
    client: Client,
    config: FetchConfig,
}

impl FeedDiscovery {
    pub fn new(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// One discovery pass: fresh query, windowed filter, exact-title
    /// prefilter. Entity topics that come back empty retry once with a
    /// 1-year window and a small cap, tagged as reduced-freshness.
    pub async fn discover(
        &self,
        topic: &TopicSpec,
        days: i64,
        max_items: usize,
    ) -> Result<DiscoveredBatch> {
        let entries = self.fetch_entries(topic, days, max_items).await?;

        if entries.is_empty() && topic.is_entity() {
            warn!(topic = %topic.key, "no fresh results, widening window to one year");
            let entries = self
                .fetch_entries(topic, FALLBACK_WINDOW_DAYS, FALLBACK_MAX_ITEMS)
                .await?;
            return Ok(DiscoveredBatch {
                entries,
                reduced_freshness: true,
            });
        }

        Ok(DiscoveredBatch {
            entries,
            reduced_freshness: false,
        })
    }

    async fn fetch_entries(
        &self,
        topic: &TopicSpec,
        days: i64,
        max_items: usize,
    ) -> Result<Vec<FeedItem>> {
        let query = build_query(topic, days);
        let url = feed_url(&query);
        debug!(topic = %topic.key, %url, "fetching feed");

        let content = self.fetch_feed(&url).await?;
        let feed = feed_rs::parser::parse(content.as_bytes())
            .map_err(|e| IngestError::Parse(format!("failed to parse feed: {}", e)))?;

        let mut entries: Vec<FeedItem> = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let title = entry.title.map(|t| t.content)?;
                if title.trim().is_empty() {
                    return None;
                }
                let link = entry.links.first()?.href.clone();
                let (published, published_at) = match entry.published {
                    Some(dt) => (dt.to_rfc2822(), Some(dt)),
                    None => (String::new(), None),
                };
                Some(FeedItem {
                    title,
                    link,
                    published,
                    published_at,
                })
            })
            .collect();

        // Process only the top slice; the feed is relevance-ordered and a
        // deep tail only adds extraction latency.
        entries.truncate(max_items);

        let cutoff = window_cutoff(Utc::now(), days);
        let screened = screen_entries(entries, cutoff);

        info!(
            topic = %topic.key,
            days,
            kept = screened.len(),
            "feed discovery pass complete"
        );
        Ok(screened)
    }

    /// Feed fetch with the standard retry/backoff loop. This is the only
    /// place that retries; extraction tiers never do.
    async fn fetch_feed(&self, url: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: StdDuration::from_secs(self.config.retry_delay_seconds),
            initial_interval: StdDuration::from_secs(self.config.retry_delay_seconds),
            max_interval: StdDuration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(StdDuration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error: Option<IngestError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(%url, attempt = attempt + 1, "feed fetch failed, retrying in {:?}", delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::General("feed fetch failed".to_string())))
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        if let Some(length) = response.content_length() {
            let size_mb = length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(IngestError::General(format!("feed too large: {}MB", size_mb)));
            }
        }

        Ok(response.text().await?)
    }
}

/// Build the boolean search query for a topic.
///
/// Entities OR their quoted aliases and AND `-` exclusions for known noise
/// categories; themes OR a broader thematic group without exclusions.
pub fn build_query(topic: &TopicSpec, days: i64) -> String {
    let when = if days <= 1 {
        "when:1d".to_string()
    } else {
        format!("when:{}d", days)
    };

    match &topic.kind {
        TopicKind::Entity {
            aliases,
            exclusions,
        } => {
            let or_group = aliases
                .iter()
                .map(|a| format!("\"{}\"", a))
                .collect::<Vec<_>>()
                .join(" OR ");
            let minus = exclusions
                .iter()
                .map(|e| {
                    if e.contains(char::is_whitespace) {
                        format!("-\"{}\"", e)
                    } else {
                        format!("-{}", e)
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            if minus.is_empty() {
                format!("({}) {}", or_group, when)
            } else {
                format!("({}) {} {}", or_group, minus, when)
            }
        }
        TopicKind::Theme { terms } => {
            let or_group = terms
                .iter()
                .map(|t| format!("\"{}\"", t))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("({}) {}", or_group, when)
        }
    }
}

pub fn feed_url(query: &str) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl=ko&gl=KR&ceid=KR:ko",
        urlencoding::encode(query)
    )
}

/// Strict client-side cutoff for a lookback of `days`.
///
/// ≤1 day is a hard 24-hour window; up to a month falls on the calendar
/// day; anything longer falls back to January 1 of the cutoff year.
pub fn window_cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    if days <= 1 {
        return now - Duration::hours(24);
    }

    let base = now - Duration::days(days);
    if days <= 30 {
        base.date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|ndt| ndt.and_utc())
            .unwrap_or(base)
    } else {
        Utc.with_ymd_and_hms(base.year(), 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(base)
    }
}

/// Apply the window filter and drop exact-title duplicates within the
/// batch. Entries without a parseable timestamp pass the window filter.
pub fn screen_entries(entries: Vec<FeedItem>, cutoff: DateTime<Utc>) -> Vec<FeedItem> {
    let mut seen_titles: HashSet<String> = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| entry.published_at.map_or(true, |dt| dt >= cutoff))
        .filter(|entry| seen_titles.insert(entry.title.clone()))
        .collect()
}

/// Lenient timestamp parsing for the free-form `published` strings carried
/// by feed entries and stored rows.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return nd.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_topics;

    fn entry(title: &str, published_at: Option<DateTime<Utc>>) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: format!("https://news.example.com/{}", title.len()),
            published: published_at.map(|dt| dt.to_rfc2822()).unwrap_or_default(),
            published_at,
        }
    }

    #[test]
    fn entity_query_quotes_aliases_and_carries_exclusions() {
        let topics = default_topics();
        let query = build_query(&topics[0], 3);
        assert!(query.contains("\"IBK캐피탈\" OR \"IBK기업은행 캐피탈\""));
        assert!(query.contains("-기부"));
        assert!(query.ends_with("when:3d"));
    }

    #[test]
    fn theme_query_ors_terms_without_exclusions() {
        let topics = default_topics();
        let query = build_query(&topics[3], 1);
        assert!(query.contains("\"한국 기준금리\" OR"));
        assert!(!query.contains('-'));
        assert!(query.ends_with("when:1d"));
    }

    #[test]
    fn window_is_24_hours_for_one_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 15, 30, 0).single().unwrap();
        assert_eq!(window_cutoff(now, 1), now - Duration::hours(24));
    }

    #[test]
    fn window_falls_on_calendar_day_within_a_month() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 15, 30, 0).single().unwrap();
        let cutoff = window_cutoff(now, 7);
        assert_eq!(
            cutoff,
            Utc.with_ymd_and_hms(2026, 7, 31, 0, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn window_beyond_a_month_is_yearly() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 15, 30, 0).single().unwrap();
        let cutoff = window_cutoff(now, 365);
        assert_eq!(
            cutoff,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn screening_enforces_window_and_passes_undated_entries() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().unwrap();
        let cutoff = window_cutoff(now, 1);

        let kept = screen_entries(
            vec![
                entry("fresh", Some(now - Duration::hours(2))),
                entry("stale", Some(now - Duration::hours(48))),
                entry("undated", None),
            ],
            cutoff,
        );

        let titles: Vec<&str> = kept.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "undated"]);

        for e in &kept {
            if let Some(dt) = e.published_at {
                assert!(now - dt <= Duration::hours(24));
            }
        }
    }

    #[test]
    fn screening_drops_exact_title_duplicates() {
        let now = Utc::now();
        let kept = screen_entries(
            vec![
                entry("같은 제목", Some(now)),
                entry("같은 제목", Some(now)),
                entry("다른 제목", Some(now)),
            ],
            now - Duration::hours(24),
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn published_parsing_is_lenient() {
        assert!(parse_published("Fri, 07 Aug 2026 03:00:00 GMT").is_some());
        assert!(parse_published("2026-08-07T03:00:00+09:00").is_some());
        assert!(parse_published("2026-08-07 03:00:00").is_some());
        assert!(parse_published("2026-08-07").is_some());
        assert!(parse_published("어제쯤").is_none());
        assert!(parse_published("").is_none());
    }
}
