//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod article;
pub mod contact;
pub mod statistics;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use statistics::{SqlxStatisticsRepository, StatisticsRepository};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};

/// Escape character used in every `LIKE ... ESCAPE` clause
pub(crate) const LIKE_ESCAPE: char = '!';

/// Separator between folded list items; never part of a search match
pub(crate) const LIST_SEPARATOR: &str = "\n";

/// Lowercase char by char so stored text and search terms fold identically
pub(crate) fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Fold a list into one column, items separated by [`LIST_SEPARATOR`]
pub(crate) fn fold_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| fold_case(item))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Build a substring pattern for `search_col LIKE ? ESCAPE '!'` against a
/// [`fold_case`]d column.
///
/// `%` and `_` in the input match literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in fold_case(search).chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Serialize a string list for a JSON TEXT column
pub(crate) fn encode_list(items: &[String]) -> Result<String> {
    serde_json::to_string(items).context("Failed to encode list column")
}

/// Decode a JSON TEXT column; NULL or empty text is an empty list
pub(crate) fn decode_list(raw: Option<String>) -> Result<Vec<String>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).context("Failed to decode list column"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Rust"), "%rust%");
        assert_eq!(like_pattern("50%"), "%50!%%");
        assert_eq!(like_pattern("a_b"), "%a!_b%");
        assert_eq!(like_pattern("wow!"), "%wow!!%");
    }

    #[test]
    fn test_fold_case_is_unicode_aware() {
        assert_eq!(fold_case("CAFÉ Meetup"), "café meetup");
        assert_eq!(like_pattern("CAFÉ"), "%café%");
        assert_eq!(fold_case("סטארטאפ"), "סטארטאפ");
    }

    #[test]
    fn test_fold_list_keeps_only_values() {
        assert_eq!(fold_list(&[]), "");
        assert_eq!(
            fold_list(&["Rust".to_string(), "AI".to_string()]),
            "rust\nai"
        );
    }

    #[test]
    fn test_decode_list() {
        assert!(decode_list(None).unwrap().is_empty());
        assert!(decode_list(Some(" ".to_string())).unwrap().is_empty());
        assert_eq!(
            decode_list(Some(r#"["סטארטאפ","ai"]"#.to_string())).unwrap(),
            vec!["סטארטאפ", "ai"]
        );
        assert!(decode_list(Some("not json".to_string())).is_err());
    }

    proptest! {
        #[test]
        fn prop_like_pattern_never_leaves_bare_wildcards(s in ".*") {
            let pattern = like_pattern(&s);
            let inner: Vec<char> = pattern[1..pattern.len() - 1].chars().collect();
            let mut i = 0;
            while i < inner.len() {
                if inner[i] == LIKE_ESCAPE {
                    prop_assert!(i + 1 < inner.len());
                    prop_assert!(matches!(inner[i + 1], '!' | '%' | '_'));
                    i += 2;
                } else {
                    prop_assert!(inner[i] != '%' && inner[i] != '_');
                    i += 1;
                }
            }
        }

        #[test]
        fn prop_list_round_trip(items in proptest::collection::vec(".*", 0..5)) {
            let encoded = encode_list(&items).unwrap();
            prop_assert_eq!(decode_list(Some(encoded)).unwrap(), items);
        }
    }
}
