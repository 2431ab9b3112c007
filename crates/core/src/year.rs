//! Release-year extraction from raw catalog titles.
//!
//! Catalog pages render titles like `Матрица (1999)`, `Интерстеллар [2014]` or `Аватар 2009`.
//! [`extract_year`] pulls the first year-looking token out and returns the tidied title.
//! Any four-digit run counts as a year; the value is not range-checked.

use regex::Regex;
use std::sync::LazyLock;

/// Tried in order; the first pattern that matches anywhere wins.
static YEAR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\((\d{4})\)",
        r"\[(\d{4})\]",
        r"(\d{4})",
        r"\((\d{4})\)\s*$",
        r"\[(\d{4})\]\s*$",
        r"(\d{4})\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static LEADING_RESIDUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s(\[\]]+").expect("static regex"));
static TRAILING_RESIDUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s(\[\]]+$").expect("static regex"));

/// Split a raw title into `(clean_title, year)`. `year` is empty when nothing matched.
pub fn extract_year(title: &str) -> (String, String) {
    let trimmed = title.trim();

    for pattern in YEAR_PATTERNS.iter() {
        let Some(caps) = pattern.captures(trimmed) else {
            continue;
        };
        let year = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let without = pattern.replacen(trimmed, 1, "");
        let collapsed = WHITESPACE.replace_all(without.trim(), " ");
        let clean = LEADING_RESIDUE.replace(&collapsed, "");
        let clean = TRAILING_RESIDUE.replace(&clean, "");
        return (clean.into_owned(), year);
    }

    (trimmed.to_string(), String::new())
}
