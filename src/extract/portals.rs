//! Tiers 2 and 3: re-find the article on a portal's own search page.
//!
//! When the publisher page resists extraction, the same story is usually
//! carried by one of the big portals in a predictable markup. The two
//! portals are independent, uncorrelated fallbacks: they index different
//! publisher sets and fail for different reasons.

use super::direct::joined_text;
use super::{normalize_search_title, ExtractedContent, ExtractionTier};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

const SEARCH_TITLE_MAX_CHARS: usize = 60;

/// Searches Naver News and extracts from the first in-portal result.
pub struct NaverSearchExtractor {
    client: Client,
}

impl NaverSearchExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionTier for NaverSearchExtractor {
    fn tier_name(&self) -> &'static str {
        "naver"
    }

    async fn attempt(&self, _url: &str, title: &str) -> Option<ExtractedContent> {
        let query = normalize_search_title(title, SEARCH_TITLE_MAX_CHARS);
        let search_url = format!(
            "https://search.naver.com/search.naver?where=news&query={}",
            urlencoding::encode(&query)
        );

        let response = self.client.get(&search_url).send().await.ok()?;
        let body = response.text().await.ok()?;
        let article_url = first_naver_link(&body)?;

        debug!(title, article_url, "naver search hit");

        let response = self.client.get(&article_url).send().await.ok()?;
        let body = response.text().await.ok()?;
        let text = extract_naver_body(&body)?;

        Some(ExtractedContent {
            text,
            summary: None,
            image_url: None,
            final_url: Some(article_url),
        })
    }
}

/// First `news.naver.com` link on the search result page. The portal marks
/// its own copies with `a.info` anchors; any other anchor into the portal
/// domain is accepted as a fallback.
fn first_naver_link(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);

    let info = Selector::parse("a.info").unwrap();
    for anchor in doc.select(&info) {
        if let Some(href) = anchor.value().attr("href") {
            if href.contains("news.naver.com") {
                return Some(href.to_string());
            }
        }
    }

    let any = Selector::parse("a[href]").unwrap();
    doc.select(&any)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("n.news.naver.com"))
        .map(|href| href.to_string())
}

/// Naver article bodies live in `#dic_area`; entertainment and sports
/// desks use `#newsEndContents` instead.
fn extract_naver_body(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);

    for css in ["#dic_area", "#newsEndContents"] {
        let selector = Selector::parse(css).unwrap();
        if let Some(container) = doc.select(&selector).next() {
            let text = joined_text(container.text());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Searches Daum News and extracts from the first in-portal result.
pub struct DaumSearchExtractor {
    client: Client,
}

impl DaumSearchExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionTier for DaumSearchExtractor {
    fn tier_name(&self) -> &'static str {
        "daum"
    }

    async fn attempt(&self, _url: &str, title: &str) -> Option<ExtractedContent> {
        let query = normalize_search_title(title, SEARCH_TITLE_MAX_CHARS);
        let search_url = format!(
            "https://search.daum.net/search?w=news&q={}",
            urlencoding::encode(&query)
        );

        let response = self.client.get(&search_url).send().await.ok()?;
        let body = response.text().await.ok()?;
        let article_url = first_daum_link(&body)?;

        debug!(title, article_url, "daum search hit");

        let response = self.client.get(&article_url).send().await.ok()?;
        let body = response.text().await.ok()?;
        let text = extract_daum_body(&body)?;

        Some(ExtractedContent {
            text,
            summary: None,
            image_url: None,
            final_url: Some(article_url),
        })
    }
}

fn first_daum_link(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);

    let any = Selector::parse("a[href]").unwrap();
    doc.select(&any)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("v.daum.net"))
        .map(|href| href.to_string())
}

fn extract_daum_body(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);

    for css in [".article_view", "#harmonyContainer"] {
        let selector = Selector::parse(css).unwrap();
        if let Some(container) = doc.select(&selector).next() {
            let text = joined_text(container.text());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
