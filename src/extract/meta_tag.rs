//! Tier 4: when nothing yields a body, settle for the page's own
//! description meta tag.

use super::direct::meta_content;
use super::{ExtractedContent, ExtractionTier};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;

pub struct MetaDescriptionExtractor {
    client: Client,
}

impl MetaDescriptionExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionTier for MetaDescriptionExtractor {
    fn tier_name(&self) -> &'static str {
        "meta"
    }

    async fn attempt(&self, url: &str, _title: &str) -> Option<ExtractedContent> {
        let response = self.client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;

        let description = read_description(&body)?;

        Some(ExtractedContent {
            text: description.clone(),
            summary: Some(description),
            image_url: None,
            final_url: None,
        })
    }
}

fn read_description(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    meta_content(&doc, "meta[property=\"og:description\"]")
        .or_else(|| meta_content(&doc, "meta[name=\"description\"]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_description_wins_over_plain_description() {
        let body = r#"<html><head>
            <meta name="description" content="일반 설명" />
            <meta property="og:description" content="오픈그래프 설명" />
        </head></html>"#;
        assert_eq!(read_description(body).as_deref(), Some("오픈그래프 설명"));
    }

    #[test]
    fn missing_description_yields_none() {
        assert!(read_description("<html><head></head></html>").is_none());
    }
}
