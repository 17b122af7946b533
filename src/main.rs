//! GIDI Ingest Service Binary Entrypoint
//! Boots the Axum HTTP server and the background sync scheduler.
//!
//! See `README.md` for quickstart and `DESIGN.md` for architecture notes.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gidi_ingest::api::{self, AppState};
use gidi_ingest::ingest::fetch::HttpPageFetcher;
use gidi_ingest::ingest::scheduler::spawn_scheduler;
use gidi_ingest::metrics::Metrics;
use gidi_ingest::{IngestConfig, MemoryStore, SourceRegistry};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
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

    // Config/registry problems at startup are fatal; a run either starts
    // with a usable configuration or not at all.
    let cfg = Arc::new(IngestConfig::load_default()?);
    let registry = Arc::new(SourceRegistry::load_default());
    let fetcher = Arc::new(HttpPageFetcher::new(cfg.fetch_timeout_secs)?);
    let store = Arc::new(MemoryStore::new());

    let metrics = Metrics::init(&cfg);

    tracing::info!(
        sources = registry.sources.len(),
        city = %cfg.city,
        interval_secs = cfg.sync_interval_secs,
        "gidi-ingest starting"
    );

    spawn_scheduler(
        fetcher.clone(),
        registry.clone(),
        store.clone(),
        cfg.clone(),
    );

    let state = AppState {
        store,
        fetcher,
        registry,
        cfg: cfg.clone(),
    };
    let app = api::router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
