#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// A single-site `[[sites]]` entry served from `base_url`.
pub fn site_entry(name: &str, base_url: &str, enabled: bool) -> String {
    format!(
        r#"
[[sites]]
name = "{name}"
base_url = "{base_url}"
search_pattern = "/search/{{query}}"
selectors = ["a.title"]
enabled = {enabled}
timeout_seconds = 5
max_results = 5
"#
    )
}

/// Writes a sites.toml with fast retries so failing mocks don't slow the suite down.
pub fn write_config(sites: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "[global]\nretry_attempts = 2\nretry_backoff_ms = 10\nconnectivity_timeout_seconds = 5"
    )
    .expect("write global");
    for site in sites {
        file.write_all(site.as_bytes()).expect("write site");
    }
    file.flush().expect("flush");
    file
}

pub const MATRIX_PAGE: &str = r#"<html><body>
<div class="results">
  <a class="title" href="/film/matrix-1999">The Matrix (1999)</a>
  <a class="title" href="/film/inception">Inception (2010)</a>
</div>
</body></html>"#;
