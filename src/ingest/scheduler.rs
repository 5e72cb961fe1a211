// src/ingest/scheduler.rs
//! Periodic triggers: an ingestion loop and an independent, less frequent
//! retention loop. Both are plain spawned interval tasks; the first tick
//! fires immediately, so the service scrapes once at boot.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::categorize::Taxonomy;
use crate::config::Config;
use crate::ingest;
use crate::ingest::types::Fetcher;
use crate::retention;
use crate::sources::SourceRegistry;
use crate::store::ArticleStore;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub scrape_interval: Duration,
    pub cleanup_interval: Duration,
    pub retention_days: i64,
}

impl SchedulerCfg {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            scrape_interval: Duration::from_secs(cfg.scrape_interval_secs),
            cleanup_interval: Duration::from_secs(cfg.cleanup_interval_secs),
            retention_days: cfg.retention_days,
        }
    }
}

/// Spawn the ingestion loop: every tick, one sequential fetch-and-merge pass
/// over all sources. Per-source failures are already captured inside
/// `run_cycle`; a tick never aborts the loop.
pub fn spawn_ingest_scheduler(
    cfg: SchedulerCfg,
    fetcher: Arc<dyn Fetcher>,
    store: ArticleStore,
    taxonomy: Arc<Taxonomy>,
    registry: Arc<SourceRegistry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.scrape_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcomes = ingest::run_cycle(fetcher.as_ref(), &store, &taxonomy, &registry).await;
            let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
            info!(
                target: "ingest",
                sources = outcomes.len(),
                failed,
                "ingestion cycle finished"
            );
        }
    })
}

/// Spawn the retention loop. Runs on its own cadence with no coordination
/// with the ingestion loop; overlap on one source is a tolerated race.
pub fn spawn_retention_scheduler(
    cfg: SchedulerCfg,
    store: ArticleStore,
    registry: Arc<SourceRegistry>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cfg.cleanup_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcomes = retention::sweep_all(&store, &registry, cfg.retention_days).await;
            let deleted: u64 = outcomes
                .iter()
                .filter_map(|(_, r)| r.as_ref().ok())
                .sum();
            info!(
                target: "retention",
                sources = outcomes.len(),
                deleted,
                "retention cycle finished"
            );
        }
    })
}
