// src/ingest/fetch.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::ingest::types::PageFetcher;

/// Browser User-Agent sent on every request. Several of the source sites
/// answer 403 to default HTTP-client identifiers.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// reqwest-backed fetcher with a bounded per-request timeout.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {url} returned {status}"));
        }
        resp.text().await.with_context(|| format!("reading body of {url}"))
    }
}
