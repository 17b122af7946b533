// src/ingest/sources.rs
//
// The static registry of named sources and the listing-side candidate
// extraction: given a source's listing page (HTML) or feed (RSS), produce
// (url, title) candidate pairs with relative links resolved against the
// source's own origin.

use anyhow::{Context, Result};
use quick_xml::de::from_str;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::ingest::config::IngestConfig;
use crate::ingest::types::{Candidate, Category};

const ENV_PATH: &str = "GIDI_SOURCES_PATH";

/// How a source exposes its listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Html,
    Feed,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub base_url: String,
    pub category: Category,
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "d_enabled")]
    pub enabled: bool,
}

fn d_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SourceRegistry {
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

impl SourceRegistry {
    /// Load from a TOML or JSON file. Falls back to `default_seed()` on
    /// any read or parse error, so a broken config degrades to the
    /// built-in Lagos set instead of an empty pipeline.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s)
                .ok()
                .or_else(|| serde_json::from_str(&s).ok())
                .unwrap_or_else(Self::default_seed),
            Err(_) => Self::default_seed(),
        }
    }

    /// Resolution order: $GIDI_SOURCES_PATH, config/sources.toml,
    /// config/sources.json, built-in seed.
    pub fn load_default() -> Self {
        if let Ok(p) = std::env::var(ENV_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let toml_p = PathBuf::from("config/sources.toml");
        if toml_p.exists() {
            return Self::load_from_file(&toml_p);
        }
        let json_p = PathBuf::from("config/sources.json");
        if json_p.exists() {
            return Self::load_from_file(&json_p);
        }
        Self::default_seed()
    }

    /// Built-in registry of Lagos outlets, used when no config is present.
    pub fn default_seed() -> Self {
        let entries: &[(&str, &str, Category, SourceKind)] = &[
            (
                "Pulse Nigeria",
                "https://www.pulse.ng/entertainment",
                Category::Entertainment,
                SourceKind::Html,
            ),
            (
                "BellaNaija",
                "https://www.bellanaija.com",
                Category::Entertainment,
                SourceKind::Html,
            ),
            (
                "NotJustOk",
                "https://notjustok.com",
                Category::Entertainment,
                SourceKind::Html,
            ),
            (
                "Vanguard News",
                "https://www.vanguardngr.com",
                Category::News,
                SourceKind::Html,
            ),
            (
                "The Guardian Nigeria",
                "https://guardian.ng",
                Category::News,
                SourceKind::Html,
            ),
            (
                "Channels TV",
                "https://www.channelstv.com/feed/",
                Category::News,
                SourceKind::Feed,
            ),
            (
                "Eventbrite Lagos",
                "https://www.eventbrite.com/d/nigeria--lagos/events/",
                Category::Events,
                SourceKind::Html,
            ),
        ];

        Self {
            sources: entries
                .iter()
                .map(|(name, base_url, category, kind)| SourceSpec {
                    name: name.to_string(),
                    base_url: base_url.to_string(),
                    category: *category,
                    kind: *kind,
                    enabled: true,
                })
                .collect(),
        }
    }

    /// Enabled sources, optionally narrowed to one category.
    pub fn matching(&self, category: Option<Category>) -> Vec<&SourceSpec> {
        self.sources
            .iter()
            .filter(|s| s.enabled && category.map_or(true, |c| s.category == c))
            .collect()
    }
}

/// Per-source relevance filter. General news sources cover the whole
/// country, so their headlines must name the city; entertainment and
/// events sources are already scoped to the local scene, so any
/// sufficiently long headline is admitted.
pub fn is_relevant(category: Category, title: &str, city: &str) -> bool {
    match category {
        Category::News => title.to_lowercase().contains(&city.to_lowercase()),
        Category::Entertainment | Category::Events => title.trim().chars().count() > 20,
    }
}

/// Extract candidate (url, title) pairs from a source's fetched listing
/// body, applying the relevance filter and the per-source cap.
pub fn listing_candidates(
    spec: &SourceSpec,
    body: &str,
    cfg: &IngestConfig,
) -> Result<Vec<Candidate>> {
    let base = Url::parse(&spec.base_url)
        .with_context(|| format!("bad base url for source {}", spec.name))?;
    match spec.kind {
        SourceKind::Html => Ok(html_candidates(spec, &base, body, cfg)),
        SourceKind::Feed => feed_candidates(spec, body, cfg),
    }
}

/// Generic structural selectors for headline links. Ordered roughly from
/// most to least specific; a link is taken from the first selector that
/// yields it.
const LISTING_SELECTORS: &[&str] = &[
    "article h2 a[href]",
    "article h3 a[href]",
    ".headline a[href]",
    ".post-title a[href]",
    "h2 a[href]",
    "h3 a[href]",
];

fn html_candidates(spec: &SourceSpec, base: &Url, body: &str, cfg: &IngestConfig) -> Vec<Candidate> {
    let doc = Html::parse_document(body);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    'selectors: for raw_sel in LISTING_SELECTORS {
        let sel = Selector::parse(raw_sel).unwrap();
        for el in doc.select(&sel) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            let title = el.text().collect::<Vec<_>>().join(" ");
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            if title.is_empty() || !is_relevant(spec.category, &title, &cfg.city) {
                continue;
            }
            let Ok(resolved) = base.join(href) else {
                continue;
            };
            let url = resolved.to_string();
            if !seen.insert(url.clone()) {
                continue;
            }
            out.push(Candidate {
                source_name: spec.name.clone(),
                category: spec.category,
                url,
                title_text: title,
            });
            if out.len() >= cfg.max_per_source {
                break 'selectors;
            }
        }
    }
    out
}

// RSS shapes for feed-kind sources.
#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

fn feed_candidates(spec: &SourceSpec, body: &str, cfg: &IngestConfig) -> Result<Vec<Candidate>> {
    let xml_clean = scrub_html_entities_for_xml(body);
    let rss: Rss = from_str(&xml_clean).with_context(|| format!("parsing {} feed xml", spec.name))?;

    let mut out = Vec::new();
    for it in rss.channel.items {
        let (Some(title), Some(link)) = (it.title, it.link) else {
            continue;
        };
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() || !is_relevant(spec.category, &title, &cfg.city) {
            continue;
        }
        out.push(Candidate {
            source_name: spec.name.clone(),
            category: spec.category,
            url: link.trim().to_string(),
            title_text: title,
        });
        if out.len() >= cfg.max_per_source {
            break;
        }
    }
    Ok(out)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
