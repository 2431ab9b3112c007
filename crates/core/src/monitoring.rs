use std::time::Duration;

use metrics::{counter, histogram};
use tracing::info;

/// Env var holding the port for the Prometheus exporter; unset means no exporter.
pub const METRICS_PORT_ENV: &str = "MOVIE_SEARCHER_METRICS_PORT";

const DEFAULT_FILTER: &str = "movie_searcher=info,movie_searcher_core=info";

/// Initialize monitoring; JSON output keeps the log quiet so stdout stays parseable.
pub fn init_monitoring_with_json(json_output: bool, debug: bool) -> anyhow::Result<()> {
    if json_output && !debug {
        init_tracing_json();
    } else {
        init_tracing(debug);
    }

    let Ok(port) = std::env::var(METRICS_PORT_ENV) else {
        return Ok(());
    };
    let port: u16 = port.trim().parse()?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    info!("Metrics endpoint available at http://localhost:{}/metrics", port);
    Ok(())
}

/// Errors only, for machine-readable output.
fn init_tracing_json() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from("error"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}

/// Initialize tracing subscriber with default configuration
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::from("movie_searcher=debug,movie_searcher_core=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_FILTER.into())
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Count one finished site search and how long it took.
pub fn record_site_search(site: &str, elapsed: Duration, results: usize) {
    counter!("movie_searcher_site_searches_total", "site" => site.to_string()).increment(1);
    counter!("movie_searcher_site_results_total", "site" => site.to_string())
        .increment(results as u64);
    histogram!("movie_searcher_site_search_seconds", "site" => site.to_string())
        .record(elapsed.as_secs_f64());
}

/// Count a search page that could not be fetched after all retries.
pub fn record_fetch_failure(site: &str) {
    counter!("movie_searcher_fetch_failures_total", "site" => site.to_string()).increment(1);
}
