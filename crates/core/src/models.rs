use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A relevant title found on one site, with its release year split out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResult {
    pub title: String,
    /// Four-digit year, or empty when the title carried none.
    pub year: String,
    /// Always absolute.
    pub url: String,
    pub site: String,
    pub site_url: String,
    pub original_title: String,
}

impl MatchResult {
    /// `Title (Year)` when a year was found, otherwise just the title.
    pub fn display_title(&self) -> String {
        if self.year.is_empty() {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, self.year)
        }
    }
}

/// Merged results of one search. URLs are unique; the first occurrence wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SearchResultSet {
    results: Vec<MatchResult>,
}

impl SearchResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `result` unless its URL is already present. Returns whether it was added.
    pub fn push(&mut self, result: MatchResult) -> bool {
        if self.results.iter().any(|r| r.url == result.url) {
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[MatchResult] {
        &self.results
    }
}

impl FromIterator<MatchResult> for SearchResultSet {
    fn from_iter<I: IntoIterator<Item = MatchResult>>(iter: I) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let results = iter
            .into_iter()
            .filter(|r| seen.insert(r.url.clone()))
            .collect();
        Self { results }
    }
}

impl IntoIterator for SearchResultSet {
    type Item = MatchResult;
    type IntoIter = std::vec::IntoIter<MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResultSet {
    type Item = &'a MatchResult;
    type IntoIter = std::slice::Iter<'a, MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

fn default_enabled() -> bool {
    true
}

/// Connection and parsing parameters for one catalog site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    /// Path template appended to `base_url`; `{query}` is replaced by the encoded query.
    pub search_pattern: String,
    #[serde(default)]
    pub alternative_patterns: Vec<String>,
    pub selectors: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub max_results: usize,
}

impl SiteConfig {
    /// Primary pattern first, then the alternatives in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.search_pattern.as_str())
            .chain(self.alternative_patterns.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub default_timeout_seconds: u64,
    pub default_max_results: usize,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub connectivity_timeout_seconds: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: 15,
            default_max_results: 5,
            retry_attempts: 2,
            retry_backoff_ms: 2000,
            connectivity_timeout_seconds: 10,
        }
    }
}

/// On-disk shape of `sites.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    pub global: Option<GlobalConfig>,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl SitesConfig {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SitesConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Outcome of probing one site's base URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Online,
    Offline(String),
    Error(String),
}

impl ConnectivityStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityStatus::Online)
    }
}

impl std::fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectivityStatus::Online => write!(f, "online"),
            ConnectivityStatus::Offline(reason) => write!(f, "offline ({reason})"),
            ConnectivityStatus::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}
