// src/ingest/validate.rs
//
// URL legitimacy and date policy checks. Extraction (parsing a date out of
// a page) lives in `extract`; the business rules about which dates are
// acceptable live here, so thresholds can move without touching parsers.

use chrono::{DateTime, Duration, Utc};

use crate::ingest::config::IngestConfig;
use crate::ingest::types::RejectReason;

/// Domain tokens that mark a link as sandbox/placeholder junk rather than a
/// real article. Matched as substrings of the whole URL.
const PLACEHOLDER_TOKENS: &[&str] = &["example.com", "localhost", "test.com", "placeholder"];

/// Cheap, network-free check that a candidate URL is worth fetching at all.
///
/// Runs twice per candidate: once before the detail fetch (so we never spend
/// a network call on junk) and once more as the final gate before the sink.
pub fn url_rejection(url: &str) -> Option<RejectReason> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Some(RejectReason::EmptyUrl);
    }
    if trimmed == "#" || trimmed.eq_ignore_ascii_case("about:blank") {
        return Some(RejectReason::PlaceholderUrl);
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("javascript:") {
        return Some(RejectReason::PlaceholderUrl);
    }
    if PLACEHOLDER_TOKENS.iter().any(|t| lower.contains(t)) {
        return Some(RejectReason::PlaceholderUrl);
    }
    None
}

/// Apply the date policy to a resolved publish date.
///
/// Two distinct horizons:
/// - the long sanity bound (`sanity_days`, ~1 year) catches bad parses;
/// - the short freshness window (`freshness_days`, ~60 days) enforces the
///   product rule that only recent content is shown.
/// A future-dated article means clock skew or a parse error and is invalid.
pub fn date_verdict(
    published: DateTime<Utc>,
    now: DateTime<Utc>,
    cfg: &IngestConfig,
) -> Result<(), RejectReason> {
    if published > now {
        return Err(RejectReason::FutureDated);
    }
    let age = now - published;
    if age > Duration::days(cfg.sanity_days) {
        return Err(RejectReason::ImplausiblyOld);
    }
    if age > Duration::days(cfg.freshness_days) {
        return Err(RejectReason::Stale);
    }
    Ok(())
}
