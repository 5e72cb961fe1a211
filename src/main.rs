//! gpress — Binary Entrypoint
//! Boots the ingestion and retention schedulers over the configured sources.
//!
//! See `README.md` for quickstart and configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gpress::categorize::Taxonomy;
use gpress::config::Config;
use gpress::ingest::fetcher::ProcessFetcher;
use gpress::ingest::scheduler::{spawn_ingest_scheduler, spawn_retention_scheduler, SchedulerCfg};
use gpress::sources::SourceRegistry;
use gpress::store::ArticleStore;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gpress=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = Config::load_default()?;
    tracing::info!(
        sources = cfg.sources.len(),
        retention_days = cfg.retention_days,
        "configuration loaded"
    );

    let store = ArticleStore::connect(&cfg.db_path).await?;
    let registry = Arc::new(SourceRegistry::from_config(&cfg.sources));
    let taxonomy = Arc::new(Taxonomy::load_default()?);
    let fetcher = Arc::new(ProcessFetcher::new(Duration::from_secs(
        cfg.fetch_timeout_secs,
    )));

    let scheduler_cfg = SchedulerCfg::from_config(&cfg);
    let ingest = spawn_ingest_scheduler(
        scheduler_cfg,
        fetcher,
        store.clone(),
        taxonomy,
        registry.clone(),
    );
    let retention = spawn_retention_scheduler(scheduler_cfg, store, registry);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    ingest.abort();
    retention.abort();
    Ok(())
}
