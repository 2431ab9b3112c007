use crate::models::{GlobalConfig, SiteConfig, SitesConfig};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder every search pattern must carry.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Retry bound and fixed backoff applied by the fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

impl From<&GlobalConfig> for RetryPolicy {
    fn from(global: &GlobalConfig) -> Self {
        Self {
            attempts: global.retry_attempts.max(1),
            backoff: Duration::from_millis(global.retry_backoff_ms),
        }
    }
}

/// Ordered, immutable set of site configurations.
///
/// Enabling or disabling a site produces a new registry; nothing is mutated in place.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    sites: Vec<SiteConfig>,
    global: GlobalConfig,
}

impl SiteRegistry {
    /// Build a registry from explicit sites, filling zero timeouts and caps from `global`.
    pub fn new(sites: Vec<SiteConfig>, global: GlobalConfig) -> anyhow::Result<Self> {
        let sites = apply_global_defaults(sites, &global);
        validate_sites(&sites)?;
        Ok(Self { sites, global })
    }

    /// Sites shipped with the binary.
    pub fn builtin() -> Self {
        let global = GlobalConfig::default();
        Self {
            sites: apply_global_defaults(hardcoded_site_configs(), &global),
            global,
        }
    }

    /// Load from `path`, falling back to the built-in sites if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!("Configuration file not found at {:?}, using defaults", path);
            return Ok(Self::builtin());
        }
        let sites_config = SitesConfig::load_from_file(path)?;
        let global = sites_config.global.unwrap_or_default();
        Self::new(sites_config.sites, global)
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.global)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.global.connectivity_timeout_seconds.max(1))
    }

    /// All sites in registry order, enabled or not.
    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    pub fn enabled(&self) -> impl Iterator<Item = &SiteConfig> {
        self.sites.iter().filter(|s| s.enabled)
    }

    pub fn get(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Copy of the registry with `name` switched on or off. Unknown names leave it unchanged.
    pub fn with_enabled(&self, name: &str, enabled: bool) -> Self {
        let mut next = self.clone();
        if let Some(site) = next
            .sites
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
        {
            site.enabled = enabled;
        }
        next
    }

    /// Copy of the registry with `site` replacing the site of the same name in place,
    /// or appended when the name is new. The result is validated like a freshly loaded one.
    pub fn with_site(&self, site: SiteConfig) -> anyhow::Result<Self> {
        let mut sites = self.sites.clone();
        match sites
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(&site.name))
        {
            Some(slot) => *slot = site,
            None => sites.push(site),
        }
        Self::new(sites, self.global.clone())
    }

    /// Keep only the named sites (case-insensitive), preserving registry order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        Self {
            sites: self
                .sites
                .iter()
                .filter(|s| names.iter().any(|n| n.as_ref().eq_ignore_ascii_case(&s.name)))
                .cloned()
                .collect(),
            global: self.global.clone(),
        }
    }

    /// One `name: enabled|disabled` line per site.
    pub fn status_lines(&self) -> Vec<String> {
        self.sites
            .iter()
            .map(|s| {
                let status = if s.enabled { "enabled" } else { "disabled" };
                format!("{}: {}", s.name, status)
            })
            .collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn apply_global_defaults(mut sites: Vec<SiteConfig>, global: &GlobalConfig) -> Vec<SiteConfig> {
    for site in &mut sites {
        if site.timeout_seconds == 0 {
            site.timeout_seconds = global.default_timeout_seconds;
        }
        if site.max_results == 0 {
            site.max_results = global.default_max_results;
        }
    }
    sites
}

/// Validate site configurations
fn validate_sites(sites: &[SiteConfig]) -> anyhow::Result<()> {
    let mut names = HashSet::new();
    for site in sites {
        if site.name.is_empty() {
            anyhow::bail!("Site name cannot be empty");
        }
        if !names.insert(site.name.to_lowercase()) {
            anyhow::bail!("Duplicate site name '{}'", site.name);
        }
        if site.base_url.is_empty() {
            anyhow::bail!("Base URL for site '{}' cannot be empty", site.name);
        }
        if let Some(bad) = site.patterns().find(|p| !p.contains(QUERY_PLACEHOLDER)) {
            anyhow::bail!(
                "Search pattern '{}' for site '{}' has no {} placeholder",
                bad,
                site.name,
                QUERY_PLACEHOLDER
            );
        }
        if site.selectors.is_empty() {
            anyhow::bail!("Selectors for site '{}' cannot be empty", site.name);
        }
        if site.timeout_seconds == 0 {
            anyhow::bail!("Timeout for site '{}' must be greater than 0", site.name);
        }
        if site.max_results == 0 {
            anyhow::bail!("Max results for site '{}' must be greater than 0", site.name);
        }
    }
    Ok(())
}

const DLE_SEARCH: &str = "/index.php?do=search&subaction=search&story={query}";

fn dle_alternatives() -> Vec<String> {
    [
        "/search/?q={query}",
        "/search/{query}",
        "/?s={query}",
        "/index.php?do=search&subaction=search&story={query}&titleonly=3",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn selectors(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn hardcoded_site_configs() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            name: "kinogo.uk".to_string(),
            base_url: "https://kinogo.uk".to_string(),
            search_pattern: DLE_SEARCH.to_string(),
            alternative_patterns: dle_alternatives(),
            selectors: selectors(&[
                ".short-item",
                ".short-title",
                ".short-text",
                ".short-item a",
                ".short-item .short-title a",
                "a[href*=\"/film/\"]",
                "a[href*=\"/serial/\"]",
                ".item",
                ".item a",
                ".movie-item",
                ".movie-title",
                ".movie-link",
                ".movie-item a",
                ".movie-item .movie-title a",
                "a[href*=\"/movie/\"]",
                "a[href*=\"/video/\"]",
                ".mainlink",
                ".mqn",
                ".th-item a",
                ".th-item",
                ".mainlink a",
                "a[href*=\"/\"]",
            ]),
            enabled: true,
            timeout_seconds: 15,
            max_results: 5,
        },
        SiteConfig {
            name: "kinokong.day".to_string(),
            base_url: "https://kinokong.day".to_string(),
            search_pattern: DLE_SEARCH.to_string(),
            alternative_patterns: dle_alternatives(),
            selectors: selectors(&[
                ".movie-item",
                ".movie-title",
                ".movie-link",
                ".movie-item a",
                ".movie-item .movie-title a",
                "a[href*=\"/film/\"]",
                "a[href*=\"/serial/\"]",
                ".item",
                ".item a",
                ".short-item",
                ".short-title",
                ".short-text",
                ".short-item a",
                ".short-item .short-title a",
                "a[href*=\"/movie/\"]",
                "a[href*=\"/video/\"]",
                ".mainlink",
                ".mqn",
                ".th-item a",
                ".th-item",
                ".mainlink a",
                "a[href*=\"/\"]",
            ]),
            enabled: true,
            timeout_seconds: 15,
            max_results: 5,
        },
        SiteConfig {
            name: "gidonline.eu".to_string(),
            base_url: "https://gidonline.eu".to_string(),
            search_pattern: DLE_SEARCH.to_string(),
            alternative_patterns: dle_alternatives(),
            selectors: selectors(&[
                ".mainlink",
                ".mqn",
                ".th-item a",
                ".th-item",
                "a[href*=\"/film/\"]",
                "a[href*=\"/serial/\"]",
                ".mainlink a",
                ".short-item",
                ".short-title",
                ".short-text",
                ".short-item a",
                ".short-item .short-title a",
                ".movie-item",
                ".movie-title",
                ".movie-link",
                ".movie-item a",
                ".movie-item .movie-title a",
                "a[href*=\"/movie/\"]",
                "a[href*=\"/video/\"]",
                ".item",
                ".item a",
                "a[href*=\"/\"]",
            ]),
            enabled: true,
            timeout_seconds: 15,
            max_results: 5,
        },
        // disabled by default
        SiteConfig {
            name: "kinopoisk.ru".to_string(),
            base_url: "https://www.kinopoisk.ru".to_string(),
            search_pattern: "/index.php?kp_query={query}".to_string(),
            alternative_patterns: Vec::new(),
            selectors: selectors(&[".film-item", ".film-title", ".film-link"]),
            enabled: false,
            timeout_seconds: 15,
            max_results: 5,
        },
        SiteConfig {
            name: "ivi.ru".to_string(),
            base_url: "https://www.ivi.ru".to_string(),
            search_pattern: "/search/?q={query}".to_string(),
            alternative_patterns: Vec::new(),
            selectors: selectors(&[".movie-item", ".movie-title", ".movie-link"]),
            enabled: false,
            timeout_seconds: 15,
            max_results: 5,
        },
    ]
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("MOVIE_SEARCHER_CONFIG_DIR") {
        PathBuf::from(config_dir).join("sites.toml")
    } else {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("movie-searcher")
            .join("sites.toml")
    }
}

/// Get the local configuration file path (for development)
pub fn local_config_path() -> PathBuf {
    PathBuf::from("config").join("sites.toml")
}
