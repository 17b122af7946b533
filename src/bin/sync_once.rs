//! One-shot pipeline run for cron/manual invocation.
//!
//! Usage: `sync_once [category] [limit]`, e.g. `sync_once entertainment 10`.
//! Prints the same JSON envelope the HTTP surface returns and exits.

use std::sync::Arc;

use gidi_ingest::api::fetch_news_envelope;
use gidi_ingest::ingest::fetch::HttpPageFetcher;
use gidi_ingest::ingest::types::Category;
use gidi_ingest::{IngestConfig, MemoryStore, SourceRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let category = match args.next().as_deref() {
        None | Some("all") => None,
        Some("news") => Some(Category::News),
        Some("entertainment") => Some(Category::Entertainment),
        Some("events") => Some(Category::Events),
        Some(other) => anyhow::bail!("unknown category '{other}' (news|entertainment|events|all)"),
    };
    let limit = args.next().map(|s| s.parse::<usize>()).transpose()?;

    let cfg = IngestConfig::load_default()?;
    let registry = SourceRegistry::load_default();
    let fetcher = HttpPageFetcher::new(cfg.fetch_timeout_secs)?;
    let store = Arc::new(MemoryStore::new());

    let envelope =
        fetch_news_envelope(store.as_ref(), &fetcher, &registry, &cfg, category, limit).await;

    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
