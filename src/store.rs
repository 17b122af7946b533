// src/store.rs
//
// Persistence boundary. The core treats storage as an opaque durable
// store behind `ArticleStore`; the in-memory implementation backs the
// service and tests, while the hosted row store of the production
// deployment lives behind the same trait.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::ingest::types::Category;

/// A durable article row. Rows are only ever logically deleted
/// (`is_active = false`); read paths always filter on active.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub category: String,
    pub external_url: String,
    pub featured_image_url: String,
    pub publish_date: DateTime<Utc>,
    pub source: String,
    pub is_active: bool,
    /// When the ingestion pass that produced/refreshed this row ran.
    pub synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Deterministic row id: hex SHA-256 of the external URL, truncated.
/// Repeated ingestion of the same logical article maps to the same id.
pub fn article_id(external_url: &str) -> String {
    let digest = Sha256::digest(external_url.as_bytes());
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    /// Active rows, newest publish date first, optionally narrowed by category.
    async fn select_active(&self, category: Option<Category>, limit: usize) -> Result<Vec<Article>>;
    /// URLs of all active rows; loaded once per ingestion run.
    async fn existing_urls(&self) -> Result<HashSet<String>>;
    /// Insert or update on the external-URL natural key.
    async fn upsert(&self, article: Article) -> Result<UpsertOutcome>;
}

/// In-memory store keyed by external URL.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("store rwlock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn select_active(&self, category: Option<Category>, limit: usize) -> Result<Vec<Article>> {
        let map = self.inner.read().expect("store rwlock poisoned");
        let mut rows: Vec<Article> = map
            .values()
            .filter(|a| a.is_active)
            .filter(|a| category.map_or(true, |c| a.category == c.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn existing_urls(&self) -> Result<HashSet<String>> {
        let map = self.inner.read().expect("store rwlock poisoned");
        Ok(map
            .values()
            .filter(|a| a.is_active)
            .map(|a| a.external_url.clone())
            .collect())
    }

    async fn upsert(&self, article: Article) -> Result<UpsertOutcome> {
        let mut map = self.inner.write().expect("store rwlock poisoned");
        match map.insert(article.external_url.clone(), article) {
            Some(_) => Ok(UpsertOutcome::Updated),
            None => Ok(UpsertOutcome::Inserted),
        }
    }
}
