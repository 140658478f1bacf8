use news_aggregator::{DedupConfig, Deduplicator, NewsItem};

fn item(title: &str, content_chars: usize) -> NewsItem {
    NewsItem {
        topic: "IBK Capital".to_string(),
        title: title.to_string(),
        link: format!("https://news.example.com/{}", content_chars),
        original_link: format!("https://news.example.com/{}", content_chars),
        published: "Fri, 07 Aug 2026 03:00:00 GMT".to_string(),
        summary: "요약".to_string(),
        full_content: "가".repeat(content_chars),
        source: "direct".to_string(),
        image_url: None,
        sentiment: None,
    }
}

#[test]
fn similar_titles_converge_to_the_richer_item() {
    let dedup = Deduplicator::new(DedupConfig::default());

    // Same story, reworded headline; similarity well above the general
    // threshold.
    let unique = dedup.dedupe(vec![
        item("A캐피탈 3분기 실적 발표", 200),
        item("A캐피탈, 3분기 실적 호조", 600),
    ]);

    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].title, "A캐피탈, 3분기 실적 호조");
    assert_eq!(unique[0].content_len(), 600);
}

#[test]
fn personnel_pairs_merge_under_the_aggressive_threshold() {
    let dedup = Deduplicator::new(DedupConfig::default());

    // Similarity of this pair sits between the personnel threshold (0.4)
    // and the general one (0.6); both titles carry personnel markers.
    let unique = dedup.dedupe(vec![
        item("A캐피탈 대표 선임", 300),
        item("A캐피탈 부사장 승진", 500),
    ]);

    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].title, "A캐피탈 부사장 승진");
}

#[test]
fn non_personnel_pairs_in_the_same_band_are_both_retained() {
    let dedup = Deduplicator::new(DedupConfig::default());

    // Same similarity band as the personnel pair above, but neither title
    // is a personnel announcement, so the general threshold applies.
    let unique = dedup.dedupe(vec![
        item("A캐피탈 금리 인하", 300),
        item("A캐피탈 회사채 발행", 500),
    ]);

    assert_eq!(unique.len(), 2);
}

#[test]
fn mixed_batch_deduplicates_to_one_item_per_story() {
    let dedup = Deduplicator::new(DedupConfig::default());

    let unique = dedup.dedupe(vec![
        item("A사 대표 선임", 200),
        item("A사 신임 대표 취임", 600),
        item("A사 3분기 실적 발표", 500),
        item("A사, 3분기 실적 호조", 300),
    ]);

    assert_eq!(unique.len(), 2);

    let titles: Vec<&str> = unique.iter().map(|i| i.title.as_str()).collect();
    assert!(titles.contains(&"A사 신임 대표 취임"));
    assert!(titles.contains(&"A사 3분기 실적 발표"));

    // The richer version of each story is the one that survives.
    assert!(unique.iter().all(|i| i.content_len() >= 500));
}

#[test]
fn output_stays_in_content_length_order() {
    let dedup = Deduplicator::new(DedupConfig::default());

    let unique = dedup.dedupe(vec![
        item("원달러 환율 전망 발표", 100),
        item("국고채 금리 급등세 지속", 400),
    ]);

    assert_eq!(unique.len(), 2);
    assert!(unique[0].content_len() >= unique[1].content_len());
}
