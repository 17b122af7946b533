// src/ingest/mod.rs
pub mod config;
pub mod dedup;
pub mod extract;
pub mod fetch;
pub mod scheduler;
pub mod sink;
pub mod sources;
pub mod types;
pub mod validate;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use url::Url;

use crate::ingest::config::IngestConfig;
use crate::ingest::dedup::{Admission, DedupState};
use crate::ingest::sources::{SourceRegistry, SourceSpec};
use crate::ingest::types::{Category, IngestReport, PageFetcher, RejectReason, SinkOutcome};
use crate::store::ArticleStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_candidates_total",
            "Candidate links pulled from source listings."
        );
        describe_counter!(
            "ingest_kept_total",
            "Candidates surviving validation + dedup, handed to the sink."
        );
        describe_counter!(
            "ingest_rejected_total",
            "Candidates dropped by URL/date/image policy."
        );
        describe_counter!("ingest_dedup_total", "Candidates removed as duplicates.");
        describe_counter!(
            "ingest_source_errors_total",
            "Source listing fetch/parse errors."
        );
        describe_histogram!("ingest_run_ms", "Full pipeline run time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Run the ingestion pipeline once: walk the matching sources in registry
/// order, validate and deduplicate their candidates, and upsert the
/// survivors. Sources are processed strictly sequentially with a fixed
/// delay in between: throttling instead of concurrency, since the target
/// sites rate-limit aggressive clients.
///
/// A failing source never aborts the run; it is logged, counted, and
/// skipped.
pub async fn run_once(
    fetcher: &dyn PageFetcher,
    registry: &SourceRegistry,
    store: &dyn ArticleStore,
    cfg: &IngestConfig,
    category: Option<Category>,
    limit: Option<usize>,
) -> IngestReport {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();
    let now = Utc::now();
    let mut report = IngestReport::default();

    let existing = match store.existing_urls().await {
        Ok(urls) => urls,
        Err(e) => {
            tracing::warn!(error = ?e, "could not load existing urls; dedup limited to this run");
            HashSet::new()
        }
    };
    let mut state = DedupState::new(existing);
    let max_total = limit.map_or(cfg.max_total, |l| l.min(cfg.max_total));

    let specs = registry.matching(category);
    let source_count = specs.len();
    for (i, spec) in specs.into_iter().enumerate() {
        if state.accepted_len() >= max_total {
            break;
        }
        match ingest_source(fetcher, spec, cfg, now, max_total, &mut state, &mut report).await {
            Ok(()) => report.sources_ok += 1,
            Err(e) => {
                tracing::warn!(error = ?e, source = %spec.name, "source error");
                counter!("ingest_source_errors_total").increment(1);
                report.sources_failed += 1;
            }
        }
        if i + 1 < source_count && cfg.source_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(cfg.source_delay_ms)).await;
        }
    }

    let accepted = state.take_accepted();
    counter!("ingest_kept_total").increment(accepted.len() as u64);
    counter!("ingest_rejected_total").increment(report.rejected_total() as u64);

    let results = sink::persist_batch(store, accepted, now, &mut state).await;
    for r in &results {
        match r.outcome {
            SinkOutcome::Inserted => report.inserted += 1,
            SinkOutcome::Updated => report.updated += 1,
            SinkOutcome::Failed { .. } => report.failed += 1,
        }
    }
    report.results = results;

    histogram!("ingest_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    gauge!("ingest_last_run_ts").set(now.timestamp().max(0) as f64);

    tracing::info!(
        target: "ingest",
        sources_ok = report.sources_ok,
        sources_failed = report.sources_failed,
        candidates = report.candidates_seen,
        rejected = report.rejected_total(),
        duplicates = report.duplicates,
        inserted = report.inserted,
        updated = report.updated,
        failed = report.failed,
        "ingest run complete"
    );

    report
}

/// Process one source: fetch its listing, then walk its candidates
/// sequentially through the cheap URL gate, the detail fetch/extraction,
/// the date and image policies, and the dedup engine. Candidate-level
/// failures drop that single candidate only.
async fn ingest_source(
    fetcher: &dyn PageFetcher,
    spec: &SourceSpec,
    cfg: &IngestConfig,
    now: DateTime<Utc>,
    max_total: usize,
    state: &mut DedupState,
    report: &mut IngestReport,
) -> anyhow::Result<()> {
    let body = fetcher.get_text(&spec.base_url).await?;
    let candidates = sources::listing_candidates(spec, &body, cfg)?;
    counter!("ingest_candidates_total").increment(candidates.len() as u64);

    for cand in candidates {
        if state.accepted_len() >= max_total {
            break;
        }
        report.candidates_seen += 1;

        // Cheap gate: never spend a detail fetch on a junk URL.
        if let Some(reason) = validate::url_rejection(&cand.url) {
            report.note_reject(reason);
            continue;
        }
        let page_url = match Url::parse(&cand.url) {
            Ok(u) => u,
            Err(_) => {
                report.note_reject(RejectReason::MalformedUrl);
                continue;
            }
        };

        let detail_body = match fetcher.get_text(&cand.url).await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(error = ?e, url = %cand.url, "detail fetch failed");
                report.note_reject(RejectReason::FetchFailed);
                continue;
            }
        };

        let Some(detail) = extract::extract_detail(&detail_body, &page_url, cfg.summary_max_chars)
        else {
            report.note_reject(RejectReason::NoPublishDate);
            continue;
        };
        if let Err(reason) = validate::date_verdict(detail.publish_date, now, cfg) {
            report.note_reject(reason);
            continue;
        }
        // An article without an image is not presentable; drop it rather
        // than persist a placeholder.
        if detail.image_url.is_none() {
            report.note_reject(RejectReason::NoImage);
            continue;
        }

        match state.admit(cand, detail) {
            Admission::Accepted => {}
            Admission::Replaced => report.replaced += 1,
            Admission::DuplicateUrl | Admission::SimilarTitle => {
                report.duplicates += 1;
                counter!("ingest_dedup_total").increment(1);
            }
        }
    }

    Ok(())
}
