use news_aggregator::{needs_refresh, NewsStore};

#[tokio::test]
async fn refresh_is_due_when_nothing_was_recorded() {
    let store = NewsStore::open_in_memory().await.unwrap();
    assert!(needs_refresh(&store).await.unwrap());
}

#[tokio::test]
async fn refresh_is_not_due_after_a_pass_today() {
    let store = NewsStore::open_in_memory().await.unwrap();
    store.record_ingestion(chrono::Utc::now()).await.unwrap();
    assert!(!needs_refresh(&store).await.unwrap());
}

#[tokio::test]
async fn stale_or_broken_timestamps_force_a_refresh() {
    let store = NewsStore::open_in_memory().await.unwrap();

    store
        .set_meta("last_updated", "2020-01-01 00:00:00")
        .await
        .unwrap();
    assert!(needs_refresh(&store).await.unwrap());

    store.set_meta("last_updated", "어제").await.unwrap();
    assert!(needs_refresh(&store).await.unwrap());
}
