use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::matcher::is_match;
use crate::models::{MatchResult, SiteConfig};
use crate::year::extract_year;

/// Href fragments that mark a link as a title page.
const TITLE_PATH_MARKERS: [&str; 4] = ["/film/", "/serial/", "/movie/", "/video/"];

static LINK_WITH_HREF: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static ANY_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("static selector"));

/// An unfiltered title/link pair pulled from a page.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub title: String,
    pub href: String,
    pub node: ElementRef<'a>,
}

/// Every element hit by `selectors` (in order, not short-circuiting), followed by the
/// link scan, deduplicated by serialized markup.
pub fn collect_elements<'a>(document: &'a Html, selectors: &[String]) -> Vec<ElementRef<'a>> {
    let mut items: Vec<ElementRef<'a>> = Vec::new();

    for raw in selectors {
        let Ok(sel) = Selector::parse(raw) else {
            tracing::debug!(selector = %raw, "skipping unparsable selector");
            continue;
        };
        let before = items.len();
        items.extend(document.select(&sel));
        tracing::debug!(selector = %raw, found = items.len() - before, "selector matched");
    }

    items.extend(
        document
            .select(&LINK_WITH_HREF)
            .filter(|link| looks_like_title_link(link)),
    );

    let mut seen: HashSet<String> = HashSet::new();
    items.retain(|el| seen.insert(el.html()));
    items
}

/// Resolve each collected element to a title and href, skipping those missing either.
pub fn extract_candidates<'a>(document: &'a Html, selectors: &[String]) -> Vec<Candidate<'a>> {
    collect_elements(document, selectors)
        .into_iter()
        .filter_map(|node| {
            let link = anchor_for(node)?;
            let title = title_for(node, link)?;
            let href = link.value().attr("href").unwrap_or("").trim();
            if href.is_empty() {
                return None;
            }
            Some(Candidate {
                title,
                href: href.to_string(),
                node,
            })
        })
        .collect()
}

/// Candidates from `html` that match `query`, as results for `site`. URLs are unique.
pub fn parse_matches(site: &SiteConfig, html: &str, query: &str) -> Vec<MatchResult> {
    if html.is_empty() {
        return Vec::new();
    }
    let document = Html::parse_document(html);

    let mut out: Vec<MatchResult> = Vec::new();
    for candidate in extract_candidates(&document, &site.selectors) {
        if !is_match(query, &candidate.title) {
            continue;
        }
        let url = resolve_url(&site.base_url, &candidate.href);
        if out.iter().any(|r| r.url == url) {
            continue;
        }
        let (title, year) = extract_year(&candidate.title);
        tracing::info!(site = %site.name, %title, %year, "found match");
        out.push(MatchResult {
            title,
            year,
            url,
            site: site.name.clone(),
            site_url: site.base_url.clone(),
            original_title: candidate.title,
        });
    }
    out
}

/// Make `href` absolute against `base_url`.
pub fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        let scheme = base_url.split("://").next().unwrap_or("https");
        return format!("{scheme}://{rest}");
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

/// Link scan heuristic: title-like href, or text that reads like a title.
fn looks_like_title_link(link: &ElementRef<'_>) -> bool {
    let href = link.value().attr("href").unwrap_or("").to_lowercase();
    if TITLE_PATH_MARKERS.iter().any(|m| href.contains(m)) {
        return true;
    }
    let text = element_text(link);
    text.chars().count() > 2
        && !text.chars().all(char::is_numeric)
        && !text.starts_with("http")
}

/// The element itself if it is a link, else its first descendant link, else the
/// first link under its parent.
fn anchor_for(node: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if node.value().name() == "a" {
        return Some(node);
    }
    node.select(&ANY_LINK).next().or_else(|| {
        node.parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.select(&ANY_LINK).next())
    })
}

/// Link `title` attribute, then link text, then the container's text.
fn title_for(node: ElementRef<'_>, link: ElementRef<'_>) -> Option<String> {
    let title = link
        .value()
        .attr("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| Some(element_text(&link)).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| element_text(&node));
    (title.chars().count() > 2).then_some(title)
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
