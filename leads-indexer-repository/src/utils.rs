//! Utility functions for the leads indexer repository.

use crate::errors::SearchIndexError;

/// Characters the search engine refuses in index names.
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Longest index name accepted, in bytes.
const MAX_INDEX_NAME_BYTES: usize = 255;

/// Validate an index name against the search engine's naming rules.
///
/// Names must be lowercase, must not contain any of `\ / * ? " < > | , # :` or spaces,
/// must not start with `-`, `_` or `+`, cannot be `.` or `..`, and are limited to 255
/// bytes.
///
/// # Example
///
/// ```
/// use leads_indexer_repository::validate_index_name;
///
/// assert!(validate_index_name("acme-leads").is_ok());
/// assert!(validate_index_name("Acme Leads").is_err());
/// ```
pub fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
    if name.is_empty() {
        return Err(SearchIndexError::validation("Index name cannot be empty"));
    }

    if name == "." || name == ".." {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' is reserved",
            name
        )));
    }

    if name.len() > MAX_INDEX_NAME_BYTES {
        return Err(SearchIndexError::validation(format!(
            "Index name is {} bytes long, maximum is {}",
            name.len(),
            MAX_INDEX_NAME_BYTES
        )));
    }

    if name.starts_with(['-', '_', '+']) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }

    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lowercase",
            name
        )));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            name, c
        )));
    }

    Ok(())
}

/// Check that a batch does not exceed `max` items.
pub fn validate_batch_size(size: usize, max: usize) -> Result<(), SearchIndexError> {
    if size > max {
        return Err(SearchIndexError::batch_size_exceeded(size, max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_index_names() {
        for name in ["leads", "acme-clientes_2024", "empresasdobrasilv12", "a.b"] {
            assert!(validate_index_name(name).is_ok(), "expected '{}' to be valid", name);
        }
    }

    #[test]
    fn test_invalid_index_names() {
        let test_cases = vec![
            ("", "empty"),
            (".", "dot"),
            ("..", "double dot"),
            ("Leads", "uppercase"),
            ("-leads", "leading dash"),
            ("_leads", "leading underscore"),
            ("+leads", "leading plus"),
            ("acme leads", "space"),
            ("acme/leads", "slash"),
            ("acme\\leads", "backslash"),
            ("acme*", "star"),
            ("acme?", "question mark"),
            ("acme\"", "quote"),
            ("acme<", "less than"),
            ("acme>", "greater than"),
            ("acme|", "pipe"),
            ("acme,leads", "comma"),
            ("acme#leads", "hash"),
            ("acme:leads", "colon"),
        ];

        for (name, description) in test_cases {
            let result = validate_index_name(name);
            assert!(
                matches!(result, Err(SearchIndexError::ValidationError(_))),
                "Expected ValidationError for '{}' ({})",
                name,
                description
            );
        }
    }

    #[test]
    fn test_index_name_too_long() {
        let name = "a".repeat(256);
        assert!(validate_index_name(&name).is_err());
        assert!(validate_index_name(&name[..255]).is_ok());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(validate_batch_size(1000, 1000).is_ok());
        assert!(matches!(
            validate_batch_size(1001, 1000),
            Err(SearchIndexError::BatchSizeExceeded {
                provided: 1001,
                max: 1000
            })
        ));
    }
}
