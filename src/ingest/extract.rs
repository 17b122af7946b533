// src/ingest/extract.rs
//
// Article detail extraction: given a fetched page, recover a canonical
// image, a publish date, and a short summary. Each field is resolved by an
// ordered list of pure `fn(&Html) -> Option<String>` strategies applied
// first-success-wins, so the priority order is a data structure rather
// than nested conditionals.
//
// Extraction is pure parsing. Whether a resolved date is acceptable is the
// `validate` module's business.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{Html, Selector};
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;
use url::Url;

use crate::ingest::types::ArticleDetail;

type Strategy = fn(&Html) -> Option<String>;

/// Image resolution order: social preview tag, alternate social card tag,
/// then the first image inside an article/content container.
const IMAGE_STRATEGIES: &[Strategy] = &[meta_og_image, meta_twitter_image, first_content_image];

/// Date resolution order: structured published-time tag, generic
/// publish-date tags, generic date tag, then a `datetime`-bearing time
/// element. The URL path pattern is tried last, outside this list, because
/// it reads the URL rather than the document.
const DATE_STRATEGIES: &[Strategy] = &[
    meta_published_time,
    meta_publish_date,
    meta_generic_date,
    time_datetime_attr,
];

/// Summary resolution order: social preview description, generic
/// description, first paragraph of an article container, first paragraph
/// of a generic content container.
const SUMMARY_STRATEGIES: &[Strategy] = &[
    meta_og_description,
    meta_description,
    first_article_paragraph,
    first_content_paragraph,
];

/// Parse a fetched article page into an [`ArticleDetail`].
///
/// Returns `None` when no date strategy resolves: freshness cannot be
/// verified for an undated page, so the candidate is an extraction failure
/// rather than an article with an "unknown" date.
pub fn extract_detail(body: &str, page_url: &Url, summary_max_chars: usize) -> Option<ArticleDetail> {
    let doc = Html::parse_document(body);

    let publish_date = DATE_STRATEGIES
        .iter()
        .find_map(|s| s(&doc).as_deref().and_then(parse_date_str))
        .or_else(|| url_path_date(page_url.as_str()))?;

    let image_url = IMAGE_STRATEGIES
        .iter()
        .find_map(|s| s(&doc))
        .and_then(|src| absolutize(page_url, &src));

    let summary = SUMMARY_STRATEGIES
        .iter()
        .find_map(|s| s(&doc).and_then(|raw| normalize_summary(&raw, summary_max_chars)));

    Some(ArticleDetail {
        image_url,
        publish_date,
        summary,
    })
}

/// Parse a date string in the formats sources actually emit:
/// RFC 3339 meta tags, RFC 2822 bylines, bare `YYYY-MM-DD` prefixes.
pub fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), 0);
    }
    if s.len() >= 10 {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return d.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
        }
    }
    None
}

/// A `/YYYY/MM/DD/` segment embedded in the article URL itself.
pub fn url_path_date(url: &str) -> Option<DateTime<Utc>> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"/(20\d{2})/(\d{1,2})/(\d{1,2})(?:/|$)").unwrap());
    let caps = re.captures(url)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Rewrite a possibly-relative image path against the page's own
/// scheme/host. Anything that cannot be joined is discarded.
fn absolutize(page_url: &Url, src: &str) -> Option<String> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return None;
    }
    page_url.join(trimmed).ok().map(|u| u.to_string())
}

/// Entity-decode, collapse whitespace, trim, and truncate with an ellipsis
/// marker when longer than `max_chars`.
fn normalize_summary(raw: &str, max_chars: usize) -> Option<String> {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let decoded = html_escape::decode_html_entities(raw);
    let collapsed = re_ws.replace_all(decoded.trim(), " ").to_string();
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() > max_chars {
        let mut cut: String = collapsed.chars().take(max_chars).collect();
        cut.push_str("...");
        return Some(cut);
    }
    Some(collapsed)
}

// --- strategies ---

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .find_map(|el| el.value().attr("content"))
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

fn meta_og_image(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[property="og:image"]"#)
}

fn meta_twitter_image(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="twitter:image"]"#)
}

fn first_content_image(doc: &Html) -> Option<String> {
    let sel = Selector::parse("article img[src], .article img[src], .post-content img[src], .entry-content img[src]").unwrap();
    doc.select(&sel)
        .find_map(|el| el.value().attr("src"))
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

fn meta_published_time(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[property="article:published_time"]"#)
}

fn meta_publish_date(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="publishdate"], meta[name="pubdate"]"#)
}

fn meta_generic_date(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="date"]"#)
}

fn time_datetime_attr(doc: &Html) -> Option<String> {
    let sel = Selector::parse("time[datetime]").unwrap();
    doc.select(&sel)
        .find_map(|el| el.value().attr("datetime"))
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

fn meta_og_description(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[property="og:description"]"#)
}

fn meta_description(doc: &Html) -> Option<String> {
    meta_content(doc, r#"meta[name="description"]"#)
}

fn first_paragraph(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    doc.select(&sel)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .find(|t| !t.trim().is_empty())
}

fn first_article_paragraph(doc: &Html) -> Option<String> {
    first_paragraph(doc, "article p, .article p")
}

fn first_content_paragraph(doc: &Html) -> Option<String> {
    first_paragraph(doc, ".post-content p, .entry-content p, .content p, main p")
}
