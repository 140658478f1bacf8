//! Tier 1: readability-style extraction straight from the candidate URL.

use super::{ExtractedContent, ExtractionTier};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

/// Known article-body containers, tried before the paragraph-density
/// fallback. Covers the major Korean portals plus common CMS markup.
const CONTENT_SELECTORS: [&str; 6] = [
    "#dic_area",
    "#newsEndContents",
    "#articleBodyContents",
    "#article-view-content-div",
    "div[itemprop=articleBody]",
    "article",
];

pub struct DirectExtractor {
    client: Client,
}

impl DirectExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionTier for DirectExtractor {
    fn tier_name(&self) -> &'static str {
        "direct"
    }

    async fn attempt(&self, url: &str, _title: &str) -> Option<ExtractedContent> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "direct fetch rejected");
            return None;
        }
        let body = response.text().await.ok()?;

        let page = parse_article_page(&body);
        let text = page.text?;

        Some(ExtractedContent {
            text,
            summary: page.description,
            image_url: page.image,
            final_url: None,
        })
    }
}

struct ArticlePage {
    text: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

/// All DOM work happens here, synchronously, so the parsed document never
/// lives across an await point.
fn parse_article_page(body: &str) -> ArticlePage {
    let doc = Html::parse_document(body);

    let text = extract_body_text(&doc);
    let description = meta_content(&doc, "meta[property=\"og:description\"]")
        .or_else(|| meta_content(&doc, "meta[name=\"description\"]"));
    let image = meta_content(&doc, "meta[property=\"og:image\"]");

    ArticlePage {
        text,
        description,
        image,
    }
}

fn extract_body_text(doc: &Html) -> Option<String> {
    for css in CONTENT_SELECTORS {
        let selector = Selector::parse(css).unwrap();
        if let Some(container) = doc.select(&selector).next() {
            let text = joined_text(container.text());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    // No known container: fall back to the page's paragraph cluster and let
    // the validator decide whether it amounts to an article.
    let p = Selector::parse("p").unwrap();
    let paragraphs: Vec<String> = doc
        .select(&p)
        .map(|el| joined_text(el.text()))
        .filter(|t| t.chars().count() > 20)
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// Join text fragments the way the portals separate paragraphs, dropping
/// inter-tag whitespace noise.
pub(crate) fn joined_text<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn meta_content(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).unwrap();
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_container_wins_over_paragraphs() {
        let html = r#"<html><body>
            <div id="dic_area">기사 본문 첫 단락입니다. 이어지는 내용.</div>
            <p>사이드바에 있는 긴 홍보 문구가 여기에 들어갑니다.</p>
        </body></html>"#;
        let page = parse_article_page(html);
        assert!(page.text.unwrap().contains("기사 본문 첫 단락"));
    }

    #[test]
    fn paragraph_fallback_collects_long_paragraphs_only() {
        let html = r#"<html><body>
            <p>짧음</p>
            <p>충분히 길게 쓴 본문 단락이 하나 있고 스무 글자를 넘습니다.</p>
        </body></html>"#;
        let page = parse_article_page(html);
        let text = page.text.unwrap();
        assert!(text.contains("본문 단락"));
        assert!(!text.contains("짧음"));
    }

    #[test]
    fn meta_tags_are_captured() {
        let html = r#"<html><head>
            <meta property="og:description" content="요약문" />
            <meta property="og:image" content="https://img.example.com/1.jpg" />
        </head><body><p></p></body></html>"#;
        let page = parse_article_page(html);
        assert_eq!(page.description.as_deref(), Some("요약문"));
        assert_eq!(page.image.as_deref(), Some("https://img.example.com/1.jpg"));
    }
}
