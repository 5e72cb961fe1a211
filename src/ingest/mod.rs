// src/ingest/mod.rs
pub mod fetcher;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::categorize::Taxonomy;
use crate::ingest::types::{FetchError, Fetcher, MergeReport, RawArticle};
use crate::sources::{SourceDescriptor, SourceRegistry};
use crate::store::{ArticleStore, ArticleUpsert};

/// One-time metrics registration (so series show up on a recorder).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_articles_total",
            "Articles parsed from fetch process output."
        );
        describe_counter!("ingest_new_total", "Articles inserted as new records.");
        describe_counter!("ingest_updated_total", "Articles merged into existing records.");
        describe_counter!(
            "ingest_skipped_total",
            "Articles skipped (missing mandatory fields or store errors)."
        );
        describe_counter!("ingest_fetch_errors_total", "Failed fetch invocations.");
        describe_counter!("ingest_runs_total", "Completed ingestion cycles.");
        describe_histogram!("ingest_fetch_ms", "One fetch-and-merge pass in milliseconds.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts when an ingestion cycle last finished."
        );
    });
}

/// Parse a scraper-supplied publication timestamp. RFC 3339 first, then the
/// RSS-style RFC 2822 shape, then bare datetime/date. Anything else degrades
/// to "unknown" rather than failing the article.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Merge one validated batch into one source's store, in batch order.
///
/// Articles without a non-empty `title` and `link` are skipped; a store
/// error on one article is logged and skipped without aborting the rest.
/// Re-merging the same batch is idempotent: zero new records, same field
/// values, only `last_scraped_at` advances.
pub async fn merge_batch(
    store: &ArticleStore,
    taxonomy: &Taxonomy,
    source_id: &str,
    batch: Vec<RawArticle>,
) -> MergeReport {
    ensure_metrics_described();
    let mut report = MergeReport::default();

    for article in batch {
        let title = article.title.as_deref().map(str::trim).unwrap_or("");
        let link = article.link.as_deref().map(str::trim).unwrap_or("");
        if title.is_empty() || link.is_empty() {
            warn!(
                source = source_id,
                link, "skipping article with missing title or link"
            );
            report.skipped += 1;
            continue;
        }

        let categories = taxonomy.classify(
            title,
            article.description().unwrap_or(""),
            article.content.as_deref().unwrap_or(""),
        );

        let upsert = ArticleUpsert {
            source: source_id.to_string(),
            link: link.to_string(),
            title: title.to_string(),
            description: article.description().map(str::to_string),
            content: article.content.clone().filter(|s| !s.is_empty()),
            image_url: article.image_url.clone().filter(|s| !s.is_empty()),
            author: article.author.clone().filter(|s| !s.is_empty()),
            published_at: article.published_at.as_deref().and_then(parse_published_at),
            categories,
        };

        let merged: anyhow::Result<bool> = async {
            if store.contains(source_id, link).await? {
                store.update(&upsert).await?;
                Ok(true)
            } else {
                store.insert(&upsert).await?;
                Ok(false)
            }
        }
        .await;

        match merged {
            Ok(true) => report.updated += 1,
            Ok(false) => report.new += 1,
            Err(e) => {
                warn!(source = source_id, link, error = ?e, "article merge failed");
                report.skipped += 1;
            }
        }
    }

    counter!("ingest_new_total").increment(report.new as u64);
    counter!("ingest_updated_total").increment(report.updated as u64);
    counter!("ingest_skipped_total").increment(report.skipped as u64);
    report
}

/// One source's full pass: fetch, then merge. Public so a manual trigger can
/// run a single source outside the scheduler.
pub async fn run_source(
    fetcher: &dyn Fetcher,
    store: &ArticleStore,
    taxonomy: &Taxonomy,
    source: &SourceDescriptor,
) -> Result<MergeReport, FetchError> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let batch = match fetcher.fetch(source).await {
        Ok(batch) => batch,
        Err(e) => {
            counter!("ingest_fetch_errors_total").increment(1);
            return Err(e);
        }
    };
    counter!("ingest_articles_total").increment(batch.len() as u64);

    let report = merge_batch(store, taxonomy, &source.id, batch).await;

    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    info!(
        target: "ingest",
        source = %source.id,
        new = report.new,
        updated = report.updated,
        skipped = report.skipped,
        "source merged"
    );
    Ok(report)
}

/// One full ingestion cycle: every registry source in order, one at a time.
/// A failure for one source is captured in its outcome slot; the cycle
/// always visits every source.
pub async fn run_cycle(
    fetcher: &dyn Fetcher,
    store: &ArticleStore,
    taxonomy: &Taxonomy,
    registry: &SourceRegistry,
) -> Vec<(String, Result<MergeReport, FetchError>)> {
    ensure_metrics_described();

    let mut outcomes = Vec::with_capacity(registry.len());
    for source in registry.iter() {
        let result = run_source(fetcher, store, taxonomy, source).await;
        if let Err(e) = &result {
            warn!(source = %source.id, error = %e, "source iteration failed");
        }
        outcomes.push((source.id.clone(), result));
    }

    counter!("ingest_runs_total").increment(1);
    gauge!("ingest_last_run_ts").set(Utc::now().timestamp().max(0) as f64);
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_at_accepts_common_shapes() {
        let rfc3339 = parse_published_at("2025-06-01T10:30:00+05:30").unwrap();
        assert_eq!(rfc3339.timestamp(), 1748754000);
        assert!(parse_published_at("Sun, 01 Jun 2025 10:30:00 GMT").is_some());
        assert!(parse_published_at("2025-06-01T10:30:00").is_some());
        assert!(parse_published_at("2025-06-01 10:30:00").is_some());
        assert!(parse_published_at("2025-06-01").is_some());
    }

    #[test]
    fn published_at_degrades_to_unknown() {
        assert!(parse_published_at("").is_none());
        assert!(parse_published_at("yesterday").is_none());
        assert!(parse_published_at("13/01/2025").is_none());
    }
}
