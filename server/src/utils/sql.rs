//! SQL utility functions

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Check that a name is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`)
///
/// Used to validate table names, aliases and field names coming from
/// resource configuration before they are rendered into statements.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Split a comma-separated request value into its items
///
/// Leading and trailing commas are ignored, items are trimmed and empty
/// items are dropped.
///
/// # Example
///
/// ```
/// use restquery_server::utils::sql::split_list;
///
/// assert_eq!(split_list(",a, b,,c,"), vec!["a", "b", "c"]);
/// ```
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .trim_matches(',')
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Whether a request value denotes a list (`a,b`) rather than a single value
///
/// Commas at either end do not count, so `"1,"` is a single value.
pub fn is_list_value(value: &str) -> bool {
    value.trim_matches(',').contains(',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("posts"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("author_id2"));
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("p.title"));
        assert!(!is_valid_identifier("name; DROP TABLE posts"));
        assert!(!is_valid_identifier("na\"me"));
    }

    #[test]
    fn test_split_list_single() {
        assert_eq!(split_list("a"), vec!["a"]);
    }

    #[test]
    fn test_split_list_trims_commas_and_spaces() {
        assert_eq!(split_list(",a, b ,c,"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_list_empty() {
        assert!(split_list("").is_empty());
        assert!(split_list(",,").is_empty());
    }

    #[test]
    fn test_is_list_value() {
        assert!(is_list_value("1,2,3"));
        assert!(!is_list_value("1"));
        assert!(!is_list_value(",1,"));
    }
}
