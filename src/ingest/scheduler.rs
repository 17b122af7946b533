// src/ingest/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::ingest::config::IngestConfig;
use crate::ingest::sources::SourceRegistry;
use crate::ingest::types::PageFetcher;
use crate::store::ArticleStore;

/// Spawn the background sync loop: a full pipeline run every
/// `sync_interval_secs`, all categories. The first tick fires immediately
/// so a freshly booted service has content without waiting a full
/// interval.
pub fn spawn_scheduler(
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<SourceRegistry>,
    store: Arc<dyn ArticleStore>,
    cfg: Arc<IngestConfig>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(cfg.sync_interval_secs));
        loop {
            ticker.tick().await;

            let report = crate::ingest::run_once(
                fetcher.as_ref(),
                registry.as_ref(),
                store.as_ref(),
                cfg.as_ref(),
                None,
                None,
            )
            .await;

            counter!("ingest_runs_total").increment(1);

            tracing::info!(
                target: "ingest",
                inserted = report.inserted,
                updated = report.updated,
                duplicates = report.duplicates,
                rejected = report.rejected_total(),
                sources_failed = report.sources_failed,
                "scheduled ingest tick"
            );
        }
    })
}
