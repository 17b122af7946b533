// src/ingest/dedup.rs
//
// Duplicate suppression for one ingestion run. Exact-URL matching runs
// first (cheapest, highest confidence), then fuzzy title matching against
// everything already accepted in this run. All state is carried in an
// explicit `DedupState` value threaded through the pipeline (no
// module-level sets), so the engine is independently testable and can be
// rerun in the same process.

use std::collections::HashSet;

use crate::ingest::types::{ArticleDetail, Candidate};

/// Minimum share of significant words (relative to the *smaller* title's
/// word set) for two titles to count as the same logical article. The
/// asymmetric containment means a short exact subtitle still matches a
/// longer elaborated headline.
pub const SIMILARITY_THRESHOLD: f64 = 0.70;

/// Words this short are connectors/stopwords and carry no identity signal.
const MIN_WORD_LEN: usize = 4;

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The set of words a title is identified by.
pub fn significant_words(title: &str) -> HashSet<String> {
    normalize_title(title)
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Shared-word count divided by the size of the smaller set. Titles that
/// reduce to zero significant words never match anything (score 0.0), so
/// all-stopword headlines cannot collapse into each other.
pub fn overlap_ratio(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / smaller as f64
}

/// A candidate that survived dedup, with its word set cached for later
/// comparisons within the same batch.
#[derive(Debug, Clone)]
pub struct AcceptedItem {
    pub candidate: Candidate,
    pub detail: ArticleDetail,
    words: HashSet<String>,
}

/// What happened to a candidate offered to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New logical article; appended to the accepted list.
    Accepted,
    /// Same logical article as an earlier acceptance, but this one carries
    /// an image the earlier one lacked; the earlier entry was swapped out.
    Replaced,
    /// URL already seen in this run or already persisted.
    DuplicateUrl,
    /// Title overlapped an accepted item past the threshold; dropped.
    SimilarTitle,
}

/// Identity state for one ingestion run.
///
/// `existing` holds URLs already persisted (loaded once at run start,
/// extended only when the sink confirms a write); `seen_in_run` guards
/// against intra-batch repeats across sources.
#[derive(Debug, Default)]
pub struct DedupState {
    existing: HashSet<String>,
    seen_in_run: HashSet<String>,
    accepted: Vec<AcceptedItem>,
}

impl DedupState {
    pub fn new(existing: HashSet<String>) -> Self {
        Self {
            existing,
            seen_in_run: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    pub fn accepted_len(&self) -> usize {
        self.accepted.len()
    }

    pub fn accepted(&self) -> &[AcceptedItem] {
        &self.accepted
    }

    pub fn take_accepted(&mut self) -> Vec<AcceptedItem> {
        std::mem::take(&mut self.accepted)
    }

    /// Record that `url` reached durable storage, so later passes in the
    /// same process treat it as already persisted.
    pub fn confirm_written(&mut self, url: &str) {
        self.existing.insert(url.to_string());
    }

    /// Offer one validated candidate to the engine. Decision order:
    /// exact URL first, then fuzzy title against accepted items (first
    /// match decides; image-bearing newcomers replace imageless matches).
    pub fn admit(&mut self, candidate: Candidate, detail: ArticleDetail) -> Admission {
        if self.existing.contains(&candidate.url) || self.seen_in_run.contains(&candidate.url) {
            return Admission::DuplicateUrl;
        }

        let words = significant_words(&candidate.title_text);
        let similar_idx = self
            .accepted
            .iter()
            .position(|a| overlap_ratio(&words, &a.words) >= SIMILARITY_THRESHOLD);

        if let Some(idx) = similar_idx {
            let prior = &self.accepted[idx];
            if detail.image_url.is_some() && prior.detail.image_url.is_none() {
                // Richer metadata wins; keep the first-seen position.
                self.seen_in_run.insert(candidate.url.clone());
                self.accepted[idx] = AcceptedItem {
                    candidate,
                    detail,
                    words,
                };
                return Admission::Replaced;
            }
            return Admission::SimilarTitle;
        }

        self.seen_in_run.insert(candidate.url.clone());
        self.accepted.push(AcceptedItem {
            candidate,
            detail,
            words,
        });
        Admission::Accepted
    }
}
