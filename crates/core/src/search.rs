//! Fan-out search across the enabled catalog sites.
//!
//! Each site runs its own cascade of (search pattern, query encoding) attempts and stops at the
//! first attempt that yields a match. Sites run concurrently on a shared client; a site that
//! fails or panics contributes nothing and never fails the whole search.

use std::time::{Duration, Instant};

use futures::future::{self, FutureExt, join_all};
use futures::stream::{self, FuturesUnordered, StreamExt};
use reqwest::Client;
use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::config::{RetryPolicy, SiteRegistry};
use crate::fetcher::{FetchError, browser_headers, build_http_client, fetch_once, fetch_with_retry};
use crate::models::{ConnectivityStatus, MatchResult, SearchResultSet, SiteConfig};
use crate::monitoring;
use crate::parser::parse_matches;
use crate::query::{QueryEncoding, build_search_url, clean_query, encode_query};

/// Longest error text kept in a connectivity status.
const STATUS_MESSAGE_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Entry point used by front ends: owns the site registry and runs searches against it.
#[derive(Debug, Clone)]
pub struct MovieSearcher {
    registry: SiteRegistry,
    headers: HeaderMap,
}

impl MovieSearcher {
    pub fn new(registry: SiteRegistry) -> Self {
        Self {
            registry,
            headers: browser_headers(),
        }
    }

    /// Replace the request headers sent to every site.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Search every enabled site concurrently and merge their matches, first URL wins.
    ///
    /// Site failures are logged and yield no results; only an empty query or a client
    /// that cannot be built is an error.
    pub async fn search(&self, query: &str) -> Result<SearchResultSet, SearchError> {
        let query = clean_query(query);
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let sites: Vec<SiteConfig> = self.registry.enabled().cloned().collect();
        if sites.is_empty() {
            tracing::warn!("no enabled sites; returning empty result set");
            return Ok(SearchResultSet::new());
        }
        tracing::info!(
            query = %query,
            sites = ?sites.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "searching enabled sites"
        );

        let client = build_http_client()?;
        let policy = self.registry.retry_policy();
        let mut tasks = FuturesUnordered::new();

        for site in sites {
            let client = client.clone();
            let headers = self.headers.clone();
            let query = query.clone();
            let name = site.name.clone();
            let handle = tokio::spawn(async move {
                let start = Instant::now();
                let results = search_site(&client, &site, &query, &headers, policy).await;
                monitoring::record_site_search(&site.name, start.elapsed(), results.len());
                results
            });
            tasks.push(handle.map(move |joined| (name, joined)));
        }

        let mut unique = SearchResultSet::new();
        while let Some((name, joined)) = tasks.next().await {
            match joined {
                Ok(results) => {
                    let found = results.len();
                    let mut added = 0usize;
                    for result in results {
                        if unique.push(result) {
                            added += 1;
                        }
                    }
                    tracing::debug!(site = %name, found, added, "site finished");
                }
                Err(e) => tracing::error!(site = %name, error = %e, "site task failed"),
            }
        }

        tracing::info!(query = %query, count = unique.len(), "search finished");
        Ok(unique)
    }

    /// Probe each enabled site's base URL once, in registry order.
    pub async fn test_connectivity(&self) -> Result<Vec<(String, ConnectivityStatus)>, SearchError> {
        let client = build_http_client()?;
        let timeout = self.registry.connectivity_timeout();
        let probes = self.registry.enabled().map(|site| {
            let client = &client;
            let headers = &self.headers;
            async move {
                let status = probe_site(client, &site.base_url, headers, timeout).await;
                (site.name.clone(), status)
            }
        });
        Ok(join_all(probes).await)
    }
}

/// Run the pattern × encoding cascade for one site, returning at most `max_results` matches.
pub async fn search_site(
    client: &Client,
    site: &SiteConfig,
    query: &str,
    headers: &HeaderMap,
    policy: RetryPolicy,
) -> Vec<MatchResult> {
    let search = SiteSearch {
        client,
        site,
        query,
        headers,
        policy,
    };
    search.run().await
}

/// Borrowed state for one site's cascade.
struct SiteSearch<'a> {
    client: &'a Client,
    site: &'a SiteConfig,
    query: &'a str,
    headers: &'a HeaderMap,
    policy: RetryPolicy,
}

impl SiteSearch<'_> {
    async fn run(&self) -> Vec<MatchResult> {
        let variants = encode_query(self.query);
        let attempts = self.site.patterns().flat_map(|pattern| {
            variants
                .iter()
                .map(move |(encoding, encoded)| (pattern, *encoding, encoded.as_str()))
        });

        let hits = stream::iter(attempts)
            .then(move |(pattern, encoding, encoded)| self.attempt(pattern, encoding, encoded))
            .filter(|results| future::ready(!results.is_empty()));
        // Boxed (rather than `pin!`) so the future stays provably `Send` for `tokio::spawn`.
        let mut hits = hits.boxed();

        let mut results = hits.next().await.unwrap_or_default();
        results.truncate(self.site.max_results);
        results
    }

    /// One cascade step; any failure is logged and counts as no results.
    async fn attempt(&self, pattern: &str, encoding: QueryEncoding, encoded: &str) -> Vec<MatchResult> {
        match self.try_attempt(pattern, encoding, encoded).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(site = %self.site.name, %pattern, error = %e, "search attempt failed");
                Vec::new()
            }
        }
    }

    async fn try_attempt(
        &self,
        pattern: &str,
        encoding: QueryEncoding,
        encoded: &str,
    ) -> anyhow::Result<Vec<MatchResult>> {
        let site = self.site;
        let url = build_search_url(&site.base_url, pattern, encoded)?;
        tracing::info!(site = %site.name, %pattern, %encoding, %url, "searching");

        let timeout = Duration::from_secs(site.timeout_seconds);
        let Some(html) = fetch_with_retry(self.client, &url, self.headers, timeout, self.policy).await
        else {
            tracing::warn!(site = %site.name, %pattern, %encoding, "failed to fetch search page");
            monitoring::record_fetch_failure(&site.name);
            return Ok(Vec::new());
        };
        tracing::debug!(site = %site.name, len = html.len(), "fetched page");
        Ok(parse_matches(site, &html, self.query))
    }
}

/// Single GET of `url` classified as online, offline or errored.
pub async fn probe_site(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
    timeout: Duration,
) -> ConnectivityStatus {
    match fetch_once(client, url, headers, timeout).await {
        Ok(_) => ConnectivityStatus::Online,
        Err(FetchError::Status(status)) => {
            ConnectivityStatus::Offline(format!("HTTP {}", status.as_u16()))
        }
        Err(FetchError::Transport(e)) if e.is_timeout() => {
            ConnectivityStatus::Offline("timeout".to_string())
        }
        Err(FetchError::Transport(e)) if e.is_connect() || e.is_request() => {
            ConnectivityStatus::Offline("connection failed".to_string())
        }
        Err(e) => ConnectivityStatus::Error(e.to_string().chars().take(STATUS_MESSAGE_LIMIT).collect()),
    }
}
