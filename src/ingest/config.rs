// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "GIDI_INGEST_CONFIG_PATH";

/// Pipeline tunables. Every field has a default so an empty file (or no
/// file at all) yields a working configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct IngestConfig {
    /// Short-horizon freshness window: items older than this are skipped.
    #[serde(default = "d_freshness_days")]
    pub freshness_days: i64,
    /// Long-horizon sanity bound: items older than this are treated as
    /// parse failures rather than merely stale.
    #[serde(default = "d_sanity_days")]
    pub sanity_days: i64,
    /// Total candidate cap across all sources in one run.
    #[serde(default = "d_max_total")]
    pub max_total: usize,
    /// Per-source candidate cap, to keep source diversity under the total cap.
    #[serde(default = "d_max_per_source")]
    pub max_per_source: usize,
    /// Fixed delay between sources; throttling instead of concurrency.
    #[serde(default = "d_source_delay_ms")]
    pub source_delay_ms: u64,
    /// Timeout for each listing/detail fetch.
    #[serde(default = "d_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// City general-news titles must mention to be considered relevant.
    #[serde(default = "d_city")]
    pub city: String,
    /// Summary truncation bound, in characters.
    #[serde(default = "d_summary_max_chars")]
    pub summary_max_chars: usize,
    /// Background sync cadence for the service binary.
    #[serde(default = "d_sync_interval_secs")]
    pub sync_interval_secs: u64,
    /// Service bind address.
    #[serde(default = "d_bind_addr")]
    pub bind_addr: String,
}

fn d_freshness_days() -> i64 {
    60
}
fn d_sanity_days() -> i64 {
    365
}
fn d_max_total() -> usize {
    15
}
fn d_max_per_source() -> usize {
    3
}
fn d_source_delay_ms() -> u64 {
    1000
}
fn d_fetch_timeout_secs() -> u64 {
    12
}
fn d_city() -> String {
    "Lagos".to_string()
}
fn d_summary_max_chars() -> usize {
    150
}
fn d_sync_interval_secs() -> u64 {
    6 * 3600
}
fn d_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            freshness_days: d_freshness_days(),
            sanity_days: d_sanity_days(),
            max_total: d_max_total(),
            max_per_source: d_max_per_source(),
            source_delay_ms: d_source_delay_ms(),
            fetch_timeout_secs: d_fetch_timeout_secs(),
            city: d_city(),
            summary_max_chars: d_summary_max_chars(),
            sync_interval_secs: d_sync_interval_secs(),
            bind_addr: d_bind_addr(),
        }
    }
}

impl IngestConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading ingest config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
    }

    /// Load using env var + fallbacks:
    /// 1) $GIDI_INGEST_CONFIG_PATH
    /// 2) config/ingest.toml
    /// 3) config/ingest.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!("GIDI_INGEST_CONFIG_PATH points to non-existent path"));
            }
        }
        let toml_p = PathBuf::from("config/ingest.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/ingest.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<IngestConfig> {
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing ingest config JSON");
    }
    if let Ok(v) = toml::from_str(s) {
        return Ok(v);
    }
    // Fallback: the file may be JSON with a non-json extension.
    serde_json::from_str(s).context("unsupported ingest config format")
}
