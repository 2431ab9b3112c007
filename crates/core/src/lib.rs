//! Concurrent movie-catalog search: query a set of sites, scrape title links from their
//! search pages and keep the ones that match the requested title.

pub mod config;
pub mod fetcher;
pub mod matcher;
pub mod models;
pub mod monitoring;
pub mod output;
pub mod parser;
pub mod query;
pub mod search;
pub mod year;

#[cfg(test)]
mod test_util;

pub use config::{RetryPolicy, SiteRegistry};
pub use matcher::is_match;
pub use models::{ConnectivityStatus, MatchResult, SearchResultSet, SiteConfig};
pub use search::{MovieSearcher, SearchError};
pub use year::extract_year;
