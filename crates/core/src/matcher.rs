use std::collections::HashSet;

/// Lowercase, turn punctuation into spaces, collapse whitespace.
pub fn normalize_title(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `candidate` counts as a hit for `query`.
///
/// Accepts, in order: equal normalized strings, the query as a substring of the candidate,
/// or every query word present as a whole word in the candidate. Supersets such as
/// `Матрица: Перезагрузка` for `Матрица` therefore match.
pub fn is_match(query: &str, candidate: &str) -> bool {
    let query_norm = normalize_title(query);
    let title_norm = normalize_title(candidate);

    if query_norm == title_norm {
        return true;
    }
    if title_norm.contains(&query_norm) {
        return true;
    }

    let title_words: HashSet<&str> = title_norm.split_whitespace().collect();
    query_norm
        .split_whitespace()
        .all(|word| title_words.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_title("  Матрица:  ПЕРЕЗАГРУЗКА!! "), "матрица перезагрузка");
        assert_eq!(normalize_title("Spider-Man (2002)"), "spider man 2002");
        assert_eq!(normalize_title("snake_case"), "snake_case");
        assert_eq!(normalize_title("..."), "");
    }

    #[test]
    fn reflexive() {
        for q in ["Матрица", "Главы государств", "Spider-Man: No Way Home", "1+1"] {
            assert!(is_match(q, q), "{q} should match itself");
        }
    }

    #[test]
    fn exact_after_normalization() {
        assert!(is_match("матрица", "МАТРИЦА"));
        assert!(is_match("Spider Man", "Spider-Man"));
    }

    #[test]
    fn substring_rule() {
        assert!(is_match("Матрица", "Матрица: Перезагрузка"));
        assert!(is_match("star wars", "Star Wars: Episode IV (1977)"));
    }

    #[test]
    fn word_set_rule_is_order_independent() {
        assert!(is_match("государств главы", "Главы государств (2023)"));
    }

    #[test]
    fn word_set_requires_whole_words() {
        assert!(!is_match("мат рица", "Матрица"));
    }

    #[test]
    fn unrelated_titles_do_not_match() {
        assert!(!is_match("Главы государств", "Другой фильм"));
        assert!(!is_match("Матрица", "Интерстеллар"));
    }
}
