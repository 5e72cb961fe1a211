// src/retention.rs
//! Retention sweeper: deletes records published before a configurable
//! horizon, per source. Records with unknown publish time are never swept;
//! the next cycle would only re-insert anything a scraper still returns.

use chrono::{Duration, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::sources::SourceRegistry;
use crate::store::ArticleStore;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("retention_deleted_total", "Records removed by retention sweeps.");
        describe_counter!("retention_errors_total", "Failed per-source retention sweeps.");
    });
}

/// Delete one source's records published before now − `retention_days`.
/// Returns the number of records removed.
pub async fn sweep(
    store: &ArticleStore,
    source_id: &str,
    retention_days: i64,
) -> anyhow::Result<u64> {
    ensure_metrics_described();
    let cutoff = Utc::now() - Duration::days(retention_days);
    let deleted = store.delete_published_before(source_id, cutoff).await?;
    counter!("retention_deleted_total").increment(deleted);
    info!(
        target: "retention",
        source = source_id,
        deleted,
        "swept records older than {retention_days}d"
    );
    Ok(deleted)
}

/// One retention cycle over every registry source, in order. A failure for
/// one source is captured in its outcome slot and never stops the others.
pub async fn sweep_all(
    store: &ArticleStore,
    registry: &SourceRegistry,
    retention_days: i64,
) -> Vec<(String, anyhow::Result<u64>)> {
    ensure_metrics_described();
    let mut outcomes = Vec::with_capacity(registry.len());
    for source in registry.iter() {
        let result = sweep(store, &source.id, retention_days).await;
        if let Err(e) = &result {
            counter!("retention_errors_total").increment(1);
            warn!(source = %source.id, error = ?e, "retention sweep failed");
        }
        outcomes.push((source.id.clone(), result));
    }
    outcomes
}
