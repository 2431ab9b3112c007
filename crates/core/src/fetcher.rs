use std::time::Duration;

use crate::config::RetryPolicy;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, HeaderMap, HeaderValue, PRAGMA, REFERER,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tokio::time::sleep;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl { .. })
    }
}

/// Shared client for one search; connections are pooled across site tasks.
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .gzip(true)
        .brotli(true)
        .http2_adaptive_window(true)
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(2)
        .build()
}

/// Header set that makes requests look like a desktop browser.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers
}

/// Decode a response body: strict UTF-8, then lossy UTF-8, then Latin-1 when the
/// lossy text would be mostly replacement characters.
pub fn decode_body(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_owned();
    }
    let lossy = String::from_utf8_lossy(bytes);
    let total = lossy.chars().count();
    let replaced = lossy.chars().filter(|c| *c == char::REPLACEMENT_CHARACTER).count();
    if replaced * 2 > total {
        bytes.iter().map(|&b| b as char).collect()
    } else {
        lossy.into_owned()
    }
}

/// One GET; anything but a 200 is an error.
pub async fn fetch_once(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
    timeout: Duration,
) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let resp = client
        .get(parsed)
        .headers(headers.clone())
        .timeout(timeout)
        .send()
        .await?;
    if resp.status() != StatusCode::OK {
        return Err(FetchError::Status(resp.status()));
    }
    let body = resp.bytes().await?;
    Ok(decode_body(&body))
}

/// GET `url` up to `policy.attempts` times with a fixed pause between tries.
///
/// Returns `None` once every attempt failed; failures are logged, never returned.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
    timeout: Duration,
    policy: RetryPolicy,
) -> Option<String> {
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match fetch_once(client, url, headers, timeout).await {
            Ok(body) => return Some(body),
            Err(e) => {
                tracing::warn!(attempt, url, error = %e, "fetch attempt failed");
                if !e.is_retryable() {
                    return None;
                }
            }
        }
        if attempt < attempts {
            sleep(policy.backoff).await;
        }
    }
    None
}
