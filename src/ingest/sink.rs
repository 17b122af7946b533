// src/ingest/sink.rs
//
// Final stage: upsert the deduplicated batch into the store. Every item
// gets an explicit per-item result so callers and tests can assert on
// outcomes; a failed write never aborts the rest of the batch.

use chrono::{DateTime, Utc};

use crate::ingest::dedup::{AcceptedItem, DedupState};
use crate::ingest::types::{SinkOutcome, SinkResult};
use crate::ingest::validate;
use crate::store::{article_id, Article, ArticleStore, UpsertOutcome};

/// Upsert `items` with `is_active = true` and the run's sync timestamp.
/// URLs are re-checked here as the last gate before persistence; every
/// confirmed write is pushed back into `state` so the run's identity set
/// stays ahead of the store.
pub async fn persist_batch(
    store: &dyn ArticleStore,
    items: Vec<AcceptedItem>,
    synced_at: DateTime<Utc>,
    state: &mut DedupState,
) -> Vec<SinkResult> {
    let mut results = Vec::with_capacity(items.len());

    for item in items {
        let url = item.candidate.url.clone();
        let title = item.candidate.title_text.clone();

        if let Some(reason) = validate::url_rejection(&url) {
            results.push(SinkResult {
                url,
                title,
                outcome: SinkOutcome::Failed {
                    reason: format!("url rejected at sink gate: {reason:?}"),
                },
            });
            continue;
        }
        let Some(image_url) = item.detail.image_url.clone() else {
            results.push(SinkResult {
                url,
                title,
                outcome: SinkOutcome::Failed {
                    reason: "no image resolved".to_string(),
                },
            });
            continue;
        };

        let article = Article {
            id: article_id(&url),
            title: title.clone(),
            summary: item.detail.summary.clone(),
            category: item.candidate.category.as_str().to_string(),
            external_url: url.clone(),
            featured_image_url: image_url,
            publish_date: item.detail.publish_date,
            source: item.candidate.source_name.clone(),
            is_active: true,
            synced_at,
        };

        match store.upsert(article).await {
            Ok(outcome) => {
                state.confirm_written(&url);
                results.push(SinkResult {
                    url,
                    title,
                    outcome: match outcome {
                        UpsertOutcome::Inserted => SinkOutcome::Inserted,
                        UpsertOutcome::Updated => SinkOutcome::Updated,
                    },
                });
            }
            Err(e) => {
                tracing::warn!(error = ?e, url = %url, "article upsert failed");
                results.push(SinkResult {
                    url,
                    title,
                    outcome: SinkOutcome::Failed {
                        reason: e.to_string(),
                    },
                });
            }
        }
    }

    results
}
