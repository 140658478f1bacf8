//! Fuzzy deduplication of a resolved batch.
//!
//! Near-duplicate coverage of one event is written with different headlines
//! by every desk, so exact matching is not enough. Titles are compared with
//! a normalized Levenshtein ratio; the longest-content item is treated as
//! the canonical representative of a story.
//!
//! O(n²) in the batch size. Fine for per-call batches of tens of items;
//! callers re-deduplicating a large archive must chunk by topic/period.

use crate::config::DedupConfig;
use crate::types::NewsItem;
use strsim::normalized_levenshtein;
use tracing::debug;

pub struct Deduplicator {
    config: DedupConfig,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Self { config }
    }

    /// True when the title reads like a personnel/appointment announcement.
    pub fn is_personnel(&self, title: &str) -> bool {
        self.config
            .personnel_markers
            .iter()
            .any(|marker| title.contains(marker.as_str()))
    }

    /// Reduce a batch to unique stories.
    ///
    /// Items are ranked by content length so the richest version of a story
    /// is accepted first, then each candidate is compared against every
    /// accepted title. Personnel announcements about the same event vary
    /// more in phrasing, so when both sides are personnel-tagged the
    /// threshold drops to the aggressive one.
    ///
    /// Output stays in content-length order; callers re-sort for display.
    pub fn dedupe(&self, mut items: Vec<NewsItem>) -> Vec<NewsItem> {
        if items.is_empty() {
            return items;
        }

        items.sort_by(|a, b| b.content_len().cmp(&a.content_len()));

        let mut unique: Vec<NewsItem> = Vec::with_capacity(items.len());

        for candidate in items {
            let candidate_personnel = self.is_personnel(&candidate.title);

            let duplicate_of = unique.iter().position(|kept| {
                let similarity = normalized_levenshtein(&candidate.title, &kept.title);

                if candidate_personnel
                    && self.is_personnel(&kept.title)
                    && similarity >= self.config.personnel_threshold
                {
                    return true;
                }
                similarity >= self.config.general_threshold
            });

            match duplicate_of {
                Some(i) => {
                    debug!(
                        dropped = %candidate.title,
                        kept = %unique[i].title,
                        "dropping near-duplicate"
                    );
                }
                None => unique.push(candidate),
            }
        }

        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DedupConfig;

    fn item(title: &str, content: &str) -> NewsItem {
        NewsItem {
            topic: "IBK Capital".to_string(),
            title: title.to_string(),
            link: "https://news.example.com/a".to_string(),
            original_link: "https://news.example.com/a".to_string(),
            published: String::new(),
            summary: String::new(),
            full_content: content.to_string(),
            source: "direct".to_string(),
            image_url: None,
            sentiment: None,
        }
    }

    #[test]
    fn personnel_marker_detection() {
        let dedup = Deduplicator::new(DedupConfig::default());
        assert!(dedup.is_personnel("신임 부사장 선임"));
        assert!(dedup.is_personnel("[인사] IBK캐피탈"));
        assert!(!dedup.is_personnel("3분기 실적 발표"));
    }

    #[test]
    fn empty_batch_stays_empty() {
        let dedup = Deduplicator::new(DedupConfig::default());
        assert!(dedup.dedupe(Vec::new()).is_empty());
    }
}
