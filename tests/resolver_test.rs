use async_trait::async_trait;
use news_aggregator::{
    ContentResolver, ContentValidator, ExtractedContent, ExtractionTier, ValidatorConfig,
};

const ARTICLE_BODY: &str = "IBK캐피탈이 3분기 실적을 발표했다. 순이익은 전년 동기 대비 \
두 자릿수로 늘었고 신규 투자 집행도 확대됐다. 회사는 하반기에도 기업금융 중심의 \
성장세가 이어질 것으로 내다봤다.";

struct FailingTier;

#[async_trait]
impl ExtractionTier for FailingTier {
    fn tier_name(&self) -> &'static str {
        "failing"
    }

    async fn attempt(&self, _url: &str, _title: &str) -> Option<ExtractedContent> {
        None
    }
}

struct FixedTier {
    text: &'static str,
    summary: Option<&'static str>,
}

#[async_trait]
impl ExtractionTier for FixedTier {
    fn tier_name(&self) -> &'static str {
        "fixed"
    }

    async fn attempt(&self, _url: &str, _title: &str) -> Option<ExtractedContent> {
        Some(ExtractedContent {
            text: self.text.to_string(),
            summary: self.summary.map(|s| s.to_string()),
            image_url: None,
            final_url: None,
        })
    }
}

fn validator() -> ContentValidator {
    ContentValidator::new(ValidatorConfig::default())
}

#[tokio::test]
async fn empty_chain_terminates_with_the_title() {
    let resolver = ContentResolver::with_tiers(Vec::new(), validator());

    let resolved = resolver
        .resolve("https://news.example.com/a", "IBK캐피탈 실적 발표")
        .await;

    assert_eq!(resolved.content, "IBK캐피탈 실적 발표");
    assert_eq!(resolved.summary, "IBK캐피탈 실적 발표");
    assert_eq!(resolved.source, "title");
    assert!(!resolved.content.is_empty());
}

#[tokio::test]
async fn first_passing_tier_wins() {
    let resolver = ContentResolver::with_tiers(
        vec![
            Box::new(FailingTier),
            Box::new(FixedTier {
                text: ARTICLE_BODY,
                summary: None,
            }),
        ],
        validator(),
    );

    let resolved = resolver
        .resolve("https://news.example.com/a", "IBK캐피탈 실적 발표")
        .await;

    assert_eq!(resolved.source, "fixed");
    assert!(resolved.content.contains("3분기 실적"));
    // No tier summary: an excerpt of the body stands in.
    assert!(!resolved.summary.is_empty());
}

#[tokio::test]
async fn rejected_output_advances_to_the_next_tier() {
    // First tier returns page chrome; the validator must reject it and the
    // chain should settle on the terminal title tier.
    let resolver = ContentResolver::with_tiers(
        vec![Box::new(FixedTier {
            text: "공유하기 로그인 구독하기",
            summary: None,
        })],
        validator(),
    );

    let resolved = resolver
        .resolve("https://news.example.com/a", "IBK캐피탈 실적 발표")
        .await;

    assert_eq!(resolved.source, "title");
    assert_eq!(resolved.content, "IBK캐피탈 실적 발표");
}

#[tokio::test]
async fn tier_summary_is_kept_when_present() {
    let resolver = ContentResolver::with_tiers(
        vec![Box::new(FixedTier {
            text: ARTICLE_BODY,
            summary: Some("발표된 실적 요약"),
        })],
        validator(),
    );

    let resolved = resolver
        .resolve("https://news.example.com/a", "IBK캐피탈 실적 발표")
        .await;

    assert_eq!(resolved.summary, "발표된 실적 요약");
}
