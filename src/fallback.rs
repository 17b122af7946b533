// src/fallback.rs
//
// Curated evergreen entries served when both the live pipeline and the
// store come up empty. Downstream consumers must always receive a usable
// payload; failures degrade to this set rather than to emptiness.

use chrono::Utc;

use crate::ingest::types::Category;
use crate::store::{article_id, Article};

/// Built-in degraded-mode content, optionally narrowed by category.
pub fn seed(category: Option<Category>, limit: usize) -> Vec<Article> {
    let now = Utc::now();
    let entries: &[(&str, &str, Category, &str)] = &[
        (
            "One Perfect Weekend in Lagos: Island to Mainland",
            "https://gidiconnect.app/guides/perfect-weekend-lagos",
            Category::Events,
            "From Friday rooftop sundowners in Victoria Island to Sunday suya on the mainland, a weekend route that never misses.",
        ),
        (
            "The Detty December Survival Guide",
            "https://gidiconnect.app/guides/detty-december",
            Category::Entertainment,
            "Concerts, beach parties, and street carnivals: how to plan transport, tickets, and recovery days for the busiest month in Lagos.",
        ),
        (
            "Ten Lagos Beaches Actually Worth the Drive",
            "https://gidiconnect.app/guides/lagos-beaches",
            Category::News,
            "Tarkwa Bay to Ilashe: entry fees, boat routes, and which beaches are best at sunrise before the crowds arrive.",
        ),
    ];

    entries
        .iter()
        .filter(|(_, _, c, _)| category.map_or(true, |want| *c == want))
        .take(limit)
        .map(|(title, url, c, summary)| Article {
            id: article_id(url),
            title: title.to_string(),
            summary: Some(summary.to_string()),
            category: c.as_str().to_string(),
            external_url: url.to_string(),
            featured_image_url: format!("{url}/cover.jpg"),
            publish_date: now,
            source: "fallback".to_string(),
            is_active: true,
            synced_at: now,
        })
        .collect()
}
