use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

use movie_searcher_core::config::{SiteRegistry, default_config_path, local_config_path};
use movie_searcher_core::search::MovieSearcher;
use movie_searcher_core::{monitoring, output};

/// Shorter queries are rejected before any site is contacted.
const MIN_QUERY_CHARS: usize = 2;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "movie-searcher", version, about = "Parallel movie catalog searcher")]
struct Cli {
    /// Title to search for (read from stdin when omitted)
    query: Option<String>,

    /// Path to sites.toml (default: platform config dir, then ./config/sites.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated site list to search; named sites are searched even if disabled
    #[arg(long)]
    sites: Option<String>,

    /// Comma-separated site list to skip for this run
    #[arg(long)]
    disable: Option<String>,

    /// Point a configured site at a mirror domain, as NAME=URL (repeatable)
    #[arg(long = "mirror", value_name = "NAME=URL")]
    mirrors: Vec<String>,

    /// Output format: json or table
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Check connectivity of every enabled site and exit
    #[arg(long, default_value_t = false)]
    status: bool,

    /// List configured sites with their enabled state and exit
    #[arg(long, default_value_t = false)]
    list_sites: bool,

    /// Verbose logging to stderr
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        return Ok(path.to_path_buf());
    }
    let default = default_config_path();
    if !default.exists() {
        let local = local_config_path();
        if local.exists() {
            return Ok(local);
        }
    }
    Ok(default)
}

fn load_registry(cli: &Cli) -> Result<SiteRegistry> {
    let path = resolve_config_path(cli.config.as_deref())?;
    let registry = SiteRegistry::load(&path)
        .with_context(|| format!("loading site config from {}", path.display()))?;
    tracing::debug!(path = %path.display(), global = ?registry.global(), "loaded site config");
    let registry = apply_mirrors(registry, &cli.mirrors)?;
    Ok(apply_site_flags(
        registry,
        cli.sites.as_deref(),
        cli.disable.as_deref(),
    ))
}

/// Swap the base URL of each named site, keeping its place in the registry.
fn apply_mirrors(registry: SiteRegistry, mirrors: &[String]) -> Result<SiteRegistry> {
    let mut registry = registry;
    for mirror in mirrors {
        let Some((name, url)) = mirror.split_once('=') else {
            anyhow::bail!("invalid mirror '{mirror}', expected NAME=URL");
        };
        let (name, url) = (name.trim(), url.trim().trim_end_matches('/'));
        let Some(site) = registry.get(name) else {
            anyhow::bail!("unknown site in mirror: {name}");
        };
        let mut site = site.clone();
        site.base_url = url.to_string();
        registry = registry
            .with_site(site)
            .with_context(|| format!("applying mirror for {name}"))?;
    }
    Ok(registry)
}

/// `--sites` narrows to (and enables) the named sites; `--disable` then switches sites off.
fn apply_site_flags(
    registry: SiteRegistry,
    sites: Option<&str>,
    disable: Option<&str>,
) -> SiteRegistry {
    let mut registry = registry;
    if let Some(csv) = sites {
        let wanted = split_csv(csv);
        for name in &wanted {
            if registry.get(name).is_none() {
                eprintln!("[info] ignoring unknown site: {name}");
            }
        }
        registry = wanted
            .iter()
            .fold(registry.select(&wanted), |r, name| r.with_enabled(name, true));
    }
    if let Some(csv) = disable {
        registry = split_csv(csv)
            .iter()
            .fold(registry, |r, name| r.with_enabled(name, false));
    }
    registry
}

fn read_query(arg: Option<&str>) -> Result<String> {
    let raw = match arg {
        Some(q) => q.to_string(),
        None => {
            use std::io::{self, Write};
            eprint!("Search phrase: ");
            let _ = io::stderr().flush();
            let mut line = String::new();
            io::stdin().read_line(&mut line)?;
            line
        }
    };
    let query = raw.trim().to_string();
    if query.is_empty() {
        anyhow::bail!("empty search phrase");
    }
    if query.chars().count() < MIN_QUERY_CHARS {
        anyhow::bail!(
            "search phrase too short (at least {} characters)",
            MIN_QUERY_CHARS
        );
    }
    Ok(query)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    monitoring::init_monitoring_with_json(cli.format == OutputFormat::Json, cli.debug)?;

    let registry = load_registry(&cli)?;

    if cli.list_sites {
        for line in registry.status_lines() {
            println!("{line}");
        }
        return Ok(());
    }

    let searcher = MovieSearcher::new(registry);

    if cli.status {
        let statuses = searcher.test_connectivity().await?;
        output::print_status(&statuses);
        return Ok(());
    }

    let query = read_query(cli.query.as_deref())?;
    tracing::debug!(%query, "starting search");
    let results = searcher.search(&query).await?;

    match cli.format {
        OutputFormat::Json => output::print_pretty_json(&query, results.as_slice()),
        OutputFormat::Table => output::print_table_grouped(results.as_slice()),
    }
    Ok(())
}
