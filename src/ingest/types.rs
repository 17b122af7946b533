// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Content category a source (and its candidates) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    News,
    Entertainment,
    Events,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Entertainment => "entertainment",
            Category::Events => "events",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw (url, title) pair pulled off a source's listing page or feed.
/// Ephemeral: lives for one scrape pass, never persisted directly.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub source_name: String, // e.g., "Pulse Nigeria"
    pub category: Category,
    pub url: String,
    pub title_text: String,
}

/// Metadata recovered from a candidate's own article page.
///
/// `publish_date` is always present here: a page where no date strategy
/// resolved is an extraction failure and never produces a detail record.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ArticleDetail {
    pub image_url: Option<String>,
    pub publish_date: DateTime<Utc>,
    pub summary: Option<String>,
}

/// Why a candidate was dropped before reaching the sink.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    EmptyUrl,
    PlaceholderUrl,
    MalformedUrl,
    FetchFailed,
    NoPublishDate,
    FutureDated,
    ImplausiblyOld,
    Stale,
    NoImage,
}

/// Per-item outcome from the ingestion sink.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SinkResult {
    pub url: String,
    pub title: String,
    #[serde(flatten)]
    pub outcome: SinkOutcome,
}

#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SinkOutcome {
    Inserted,
    Updated,
    Failed { reason: String },
}

/// Counters and per-item outcomes for one pipeline run.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct IngestReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub candidates_seen: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
    pub duplicates: usize,
    pub replaced: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub results: Vec<SinkResult>,
}

impl IngestReport {
    pub fn note_reject(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_insert(0) += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Fetches one page body as text. The production impl is a reqwest client
/// with a browser User-Agent and a bounded timeout; tests substitute
/// fixture-backed fakes.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String>;
}
