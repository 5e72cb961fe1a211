// tests/retention_sweep.rs
use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use gpress::config::SourceConfig;
use gpress::retention::{sweep, sweep_all};
use gpress::sources::SourceRegistry;
use gpress::store::{ArticleStore, ArticleUpsert};

fn upsert(source: &str, link: &str, published_days_ago: Option<i64>) -> ArticleUpsert {
    ArticleUpsert {
        source: source.to_string(),
        link: link.to_string(),
        title: "t".to_string(),
        description: None,
        content: None,
        image_url: None,
        author: None,
        published_at: published_days_ago.map(|d| Utc::now() - Duration::days(d)),
        categories: BTreeSet::new(),
    }
}

#[tokio::test]
async fn sweep_deletes_only_records_past_the_horizon() {
    let store = ArticleStore::connect_memory().await.unwrap();
    store.insert(&upsert("s", "http://s/old", Some(15))).await.unwrap();
    store.insert(&upsert("s", "http://s/fresh", Some(5))).await.unwrap();
    store.insert(&upsert("s", "http://s/undated", None)).await.unwrap();

    let deleted = sweep(&store, "s", 10).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(store.get("s", "http://s/old").await.unwrap().is_none());
    assert!(store.get("s", "http://s/fresh").await.unwrap().is_some());
    // Unknown publish time is never matched by the horizon comparison.
    assert!(store.get("s", "http://s/undated").await.unwrap().is_some());
}

#[tokio::test]
async fn sweep_is_scoped_to_one_source() {
    let store = ArticleStore::connect_memory().await.unwrap();
    store.insert(&upsert("s1", "http://x/1", Some(15))).await.unwrap();
    store.insert(&upsert("s2", "http://x/1", Some(15))).await.unwrap();

    let deleted = sweep(&store, "s1", 10).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count("s1").await.unwrap(), 0);
    assert_eq!(store.count("s2").await.unwrap(), 1);
}

#[tokio::test]
async fn sweep_all_visits_every_source_in_order() {
    let store = ArticleStore::connect_memory().await.unwrap();
    store.insert(&upsert("s1", "http://x/1", Some(20))).await.unwrap();
    store.insert(&upsert("s2", "http://x/2", Some(20))).await.unwrap();

    let configs: Vec<SourceConfig> = ["s1", "s2", "s3"]
        .iter()
        .map(|id| SourceConfig {
            id: id.to_string(),
            command: "unused".to_string(),
            args: vec![],
        })
        .collect();
    let registry = SourceRegistry::from_config(&configs);

    let outcomes = sweep_all(&store, &registry, 10).await;
    let ids: Vec<&str> = outcomes.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
    assert_eq!(*outcomes[0].1.as_ref().unwrap(), 1);
    assert_eq!(*outcomes[1].1.as_ref().unwrap(), 1);
    // A source with nothing stored sweeps zero records, not an error.
    assert_eq!(*outcomes[2].1.as_ref().unwrap(), 0);
}
