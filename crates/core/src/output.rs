use colored_json::ToColoredJson;
use serde_json::json;

use crate::models::{ConnectivityStatus, MatchResult};
use tabled::{Table, Tabled, settings::Style};
use terminal_size::{Width as TWidth, terminal_size};
use textwrap::fill as tw_fill;

const FALLBACK_TERM_COLS: usize = 100;
const MIN_TITLE_COLS: usize = 20;
/// Borders and padding of a two-column rounded table.
const TABLE_CHROME_COLS: usize = 7;

/// Columns left for the title once the widest URL and the table borders are placed.
pub fn title_columns(term_cols: usize, widest_url: usize) -> usize {
    term_cols
        .saturating_sub(widest_url + TABLE_CHROME_COLS)
        .max(MIN_TITLE_COLS)
}

fn terminal_columns() -> usize {
    match terminal_size().map(|(w, _)| w) {
        Some(TWidth(n)) if n as usize > MIN_TITLE_COLS => n as usize,
        _ => FALLBACK_TERM_COLS,
    }
}

pub fn print_pretty_json(query: &str, results: &[MatchResult]) {
    let value = json!({
        "query": query,
        "count": results.len(),
        "results": results,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(s) => match s.to_colored_json_auto() {
            Ok(cs) => println!("{cs}"),
            Err(_) => println!("{s}"),
        },
        Err(e) => eprintln!("failed to serialize results: {e}"),
    }
}

/// One block per site, in the order the sites first appear in `results`.
struct SiteGroup<'a> {
    site: &'a str,
    site_url: &'a str,
    rows: Vec<&'a MatchResult>,
}

impl SiteGroup<'_> {
    fn heading(&self) -> String {
        format!("{} ({}):", self.site, self.site_url)
    }
}

fn group_by_site(results: &[MatchResult]) -> Vec<SiteGroup<'_>> {
    let mut groups: Vec<SiteGroup<'_>> = Vec::new();
    for r in results {
        match groups.iter_mut().find(|g| g.site == r.site) {
            Some(group) => group.rows.push(r),
            None => groups.push(SiteGroup {
                site: &r.site,
                site_url: &r.site_url,
                rows: vec![r],
            }),
        }
    }
    groups
}

pub fn print_table_grouped(results: &[MatchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    let plain = std::env::var("NO_TABLE").ok().as_deref() == Some("1");
    let term_cols = terminal_columns();

    for group in group_by_site(results) {
        println!("{}", group.heading());
        if plain {
            for r in &group.rows {
                println!("  - {} ({})", r.display_title(), r.url);
            }
            println!();
            continue;
        }
        let widest_url = group
            .rows
            .iter()
            .map(|r| r.url.chars().count())
            .max()
            .unwrap_or(0);
        let wrap = title_columns(term_cols, widest_url);
        let rows: Vec<DisplayRow> = group
            .rows
            .iter()
            .map(|r| DisplayRow::wrapped(r, wrap))
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}\n");
    }
}

pub fn print_status(statuses: &[(String, ConnectivityStatus)]) {
    if statuses.is_empty() {
        println!("No enabled sites.");
        return;
    }
    for (site, status) in statuses {
        println!("{}", status_line(site, status));
    }
    let online = statuses.iter().filter(|(_, s)| s.is_online()).count();
    println!("{online}/{} sites online", statuses.len());
}

fn status_line(site: &str, status: &ConnectivityStatus) -> String {
    format!("{site}: {status}")
}

#[derive(Clone, Tabled)]
struct DisplayRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "URL")]
    url: String,
}

impl DisplayRow {
    fn wrapped(r: &MatchResult, width: usize) -> Self {
        let title = r.display_title();
        let title = if title.chars().count() > width {
            tw_fill(&title, width)
        } else {
            title
        };
        Self {
            title,
            url: r.url.clone(),
        }
    }
}
