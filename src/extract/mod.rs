//! Layered content extraction.
//!
//! Getting usable article text out of Korean news links is the hard part of
//! ingestion: redirect obfuscation, paywalls and boilerplate-only pages make
//! any single extraction route unreliable. The resolver therefore runs an
//! ordered chain of interchangeable tiers, each a [`ExtractionTier`]
//! implementation, and the first output accepted by the validator wins.
//! A tier failure of any kind (timeout, connection error, parse error) is
//! absorbed as `None`; the chain always terminates in the title itself, so
//! the result body is never empty.

pub mod direct;
pub mod meta_tag;
pub mod portals;

use crate::types::ResolvedContent;
use crate::validator::ContentValidator;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

pub use direct::DirectExtractor;
pub use meta_tag::MetaDescriptionExtractor;
pub use portals::{DaumSearchExtractor, NaverSearchExtractor};

/// Raw output of one extraction tier, before validation.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    /// Set when the text was read from a different URL than the candidate.
    pub final_url: Option<String>,
}

/// One strategy in the fallback chain.
///
/// `attempt` is total: network and parse failures come back as `None`,
/// never as an error, so one bad article can never abort a batch.
#[async_trait]
pub trait ExtractionTier: Send + Sync {
    fn tier_name(&self) -> &'static str;

    async fn attempt(&self, url: &str, title: &str) -> Option<ExtractedContent>;
}

/// Orchestrates the tier chain, gated by the content validator.
pub struct ContentResolver {
    tiers: Vec<Box<dyn ExtractionTier>>,
    validator: ContentValidator,
}

impl ContentResolver {
    /// Build the standard chain: direct extraction, two independent portal
    /// searches, then the raw meta description.
    pub fn new(client: Client, validator: ContentValidator) -> Self {
        let tiers: Vec<Box<dyn ExtractionTier>> = vec![
            Box::new(DirectExtractor::new(client.clone())),
            Box::new(NaverSearchExtractor::new(client.clone())),
            Box::new(DaumSearchExtractor::new(client.clone())),
            Box::new(MetaDescriptionExtractor::new(client)),
        ];
        Self { tiers, validator }
    }

    /// Custom tier chain; used by tests and callers with special sources.
    pub fn with_tiers(tiers: Vec<Box<dyn ExtractionTier>>, validator: ContentValidator) -> Self {
        Self { tiers, validator }
    }

    /// Resolve `(content, summary)` for one article. Total: always returns
    /// a non-empty body within a bounded number of tiers — worst case the
    /// title itself.
    pub async fn resolve(&self, url: &str, title: &str) -> ResolvedContent {
        for tier in &self.tiers {
            let Some(extracted) = tier.attempt(url, title).await else {
                debug!(tier = tier.tier_name(), url, "tier failed, advancing");
                continue;
            };

            let text = clean_text(&extracted.text);
            if !self.validator.is_article(&text) {
                debug!(tier = tier.tier_name(), url, "tier output rejected by validator");
                continue;
            }

            let summary = extracted
                .summary
                .map(|s| clean_text(&s))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| excerpt(&text, 200));

            return ResolvedContent {
                content: text,
                summary,
                source: tier.tier_name().to_string(),
                image_url: extracted.image_url,
                final_url: extracted.final_url,
            };
        }

        info!(url, title, "all extraction tiers failed, keeping title as content");
        ResolvedContent {
            content: title.to_string(),
            summary: title.to_string(),
            source: "title".to_string(),
            image_url: None,
            final_url: None,
        }
    }
}

/// Strip reporter bylines, e-mail addresses and press copyright suffixes
/// that Korean wire copy drags along.
pub fn clean_text(text: &str) -> String {
    static RE_BYLINE: OnceCell<Regex> = OnceCell::new();
    static RE_EMAIL: OnceCell<Regex> = OnceCell::new();

    let re_byline = RE_BYLINE
        .get_or_init(|| Regex::new(r"^(\[[^\]]*\]|\([^)]*(=|기자)[^)]*\)|[가-힣]{2,4} 기자 = )").unwrap());
    let re_email = RE_EMAIL
        .get_or_init(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

    let mut out = text.trim().to_string();
    // Bylines stack ("[outlet] name 기자 = ..."), so strip until stable.
    loop {
        let next = re_byline.replace(out.trim_start(), "").into_owned();
        if next == out {
            break;
        }
        out = next;
    }
    out = re_email.replace_all(&out, "").to_string();
    out = out.replace("무단전재 및 재배포 금지", "");
    out = out.replace("무단 전재 및 재배포 금지", "");

    out.trim().to_string()
}

/// Char-aware excerpt, preferring a sentence boundary.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind('.') {
        Some(pos) => truncated[..pos + 1].to_string(),
        None => format!("{}...", truncated.trim_end()),
    }
}

/// Normalize a feed title for portal search: strip the trailing
/// `" - <outlet>"` suffix the aggregator appends, then bound the length.
pub fn normalize_search_title(title: &str, max_chars: usize) -> String {
    let head = title
        .rsplit_once(" - ")
        .or_else(|| title.rsplit_once(" – "))
        .map(|(head, _)| head)
        .unwrap_or(title);

    let head = head.trim();
    if head.chars().count() > max_chars {
        head.chars().take(max_chars).collect()
    } else {
        head.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_bylines_and_emails() {
        let raw = "[서울=연합뉴스] 홍길동 기자 = 본문입니다. 문의는 hong@example.com 으로.";
        let cleaned = clean_text(raw);
        assert!(!cleaned.contains("[서울=연합뉴스]"));
        assert!(!cleaned.contains("@example.com"));
        assert!(cleaned.contains("본문입니다"));
    }

    #[test]
    fn clean_text_drops_copyright_suffix() {
        let raw = "기사 본문. 무단전재 및 재배포 금지";
        assert_eq!(clean_text(raw), "기사 본문.");
    }

    #[test]
    fn normalize_title_strips_outlet_suffix() {
        assert_eq!(
            normalize_search_title("IBK캐피탈 3분기 실적 발표 - 매일경제", 60),
            "IBK캐피탈 3분기 실적 발표"
        );
    }

    #[test]
    fn normalize_title_bounds_length() {
        let long = "가".repeat(100);
        assert_eq!(normalize_search_title(&long, 60).chars().count(), 60);
    }

    #[test]
    fn excerpt_is_char_aware() {
        let text = "한".repeat(300);
        let e = excerpt(&text, 200);
        assert!(e.chars().count() <= 203);
    }
}
