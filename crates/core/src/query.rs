use crate::config::QUERY_PLACEHOLDER;

/// How a query is written into a search URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEncoding {
    /// Reserved characters and non-ASCII escaped, spaces as `%20`.
    Percent,
    /// Spaces replaced by `+`, nothing else escaped.
    Plus,
}

impl QueryEncoding {
    /// Every encoding, in the order they are tried.
    pub const ALL: [QueryEncoding; 2] = [QueryEncoding::Percent, QueryEncoding::Plus];

    pub fn encode(self, query: &str) -> String {
        let cleaned = clean_query(query);
        match self {
            QueryEncoding::Percent => urlencoding::encode(&cleaned).into_owned(),
            QueryEncoding::Plus => cleaned.replace(' ', "+"),
        }
    }
}

impl std::fmt::Display for QueryEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryEncoding::Percent => write!(f, "percent"),
            QueryEncoding::Plus => write!(f, "plus"),
        }
    }
}

pub fn normalize_query(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace and drop double quotes.
pub fn clean_query(input: &str) -> String {
    normalize_query(&input.replace('"', ""))
}

/// All encodings of `query`, in cascade order.
pub fn encode_query(query: &str) -> Vec<(QueryEncoding, String)> {
    QueryEncoding::ALL
        .iter()
        .map(|enc| (*enc, enc.encode(query)))
        .collect()
}

/// `base_url` + `pattern` with the placeholder replaced by an already-encoded query.
pub fn build_search_url(base_url: &str, pattern: &str, encoded_query: &str) -> anyhow::Result<String> {
    if !pattern.contains(QUERY_PLACEHOLDER) {
        anyhow::bail!("search pattern '{}' has no {} placeholder", pattern, QUERY_PLACEHOLDER);
    }
    Ok(format!(
        "{}{}",
        base_url,
        pattern.replace(QUERY_PLACEHOLDER, encoded_query)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_spaces() {
        assert_eq!(normalize_query("  hello   world  "), "hello world");
    }

    #[test]
    fn normalize_handles_empty_and_tabs() {
        assert_eq!(normalize_query("\t\t"), "");
        assert_eq!(normalize_query("a\t\tb"), "a b");
        assert_eq!(normalize_query(" a \n b \r\n c "), "a b c");
    }

    #[test]
    fn clean_strips_quotes() {
        assert_eq!(clean_query(" \"Матрица\"   Перезагрузка "), "Матрица Перезагрузка");
    }

    #[test]
    fn percent_encoding_escapes_reserved_and_unicode() {
        assert_eq!(QueryEncoding::Percent.encode("the  matrix"), "the%20matrix");
        assert_eq!(QueryEncoding::Percent.encode("a&b"), "a%26b");
        assert_eq!(
            QueryEncoding::Percent.encode("Матрица"),
            "%D0%9C%D0%B0%D1%82%D1%80%D0%B8%D1%86%D0%B0"
        );
    }

    #[test]
    fn plus_encoding_only_replaces_spaces() {
        assert_eq!(QueryEncoding::Plus.encode(" Главы  государств "), "Главы+государств");
        assert_eq!(QueryEncoding::Plus.encode("a&b"), "a&b");
    }

    #[test]
    fn encode_query_yields_both_in_order() {
        let variants = encode_query("the matrix");
        assert_eq!(
            variants,
            vec![
                (QueryEncoding::Percent, "the%20matrix".to_string()),
                (QueryEncoding::Plus, "the+matrix".to_string()),
            ]
        );
    }

    #[test]
    fn build_url_substitutes_placeholder() {
        let url = build_search_url(
            "https://kinogo.uk",
            "/index.php?do=search&subaction=search&story={query}",
            "the+matrix",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://kinogo.uk/index.php?do=search&subaction=search&story=the+matrix"
        );
    }

    #[test]
    fn build_url_rejects_pattern_without_placeholder() {
        assert!(build_search_url("https://x", "/search", "q").is_err());
    }
}
