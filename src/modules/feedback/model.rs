//! List-query translation: sort keys and field selection.

use classpulse_core::serde::split_csv;

/// ORDER BY used when no valid sort key is given.
pub const DEFAULT_ORDER: &str = "f.created_at DESC";

/// Maps a camelCase sort key to its column. Keys outside this list are ignored.
fn sort_column(key: &str) -> Option<&'static str> {
    match key {
        "createdAt" => Some("f.created_at"),
        "updatedAt" => Some("f.updated_at"),
        "rating" => Some("f.rating"),
        "subject" => Some("f.subject"),
        "status" => Some("f.status"),
        "semester" => Some("f.semester"),
        "academicYear" => Some("f.academic_year"),
        _ => None,
    }
}

/// Builds an ORDER BY body from `sort=-createdAt,rating`. Output only ever contains
/// whitelisted column names, so it is safe to splice into SQL.
pub fn order_by_clause(sort: Option<&str>) -> String {
    let mut terms: Vec<String> = Vec::new();

    for key in split_csv(sort) {
        let (key, direction) = match key.strip_prefix('-') {
            Some(rest) => (rest, "DESC"),
            None => (key.as_str(), "ASC"),
        };
        if let Some(column) = sort_column(key) {
            if !terms.iter().any(|t| t.starts_with(&format!("{} ", column))) {
                terms.push(format!("{} {}", column, direction));
            }
        }
    }

    if terms.is_empty() {
        terms.push(DEFAULT_ORDER.to_string());
    }
    // stable paging across equal sort values
    terms.push("f.id ASC".to_string());
    terms.join(", ")
}

/// Requested response keys from `select=subject,rating`.
pub fn selected_fields(select: Option<&str>) -> Vec<String> {
    split_csv(select)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        assert_eq!(order_by_clause(None), "f.created_at DESC, f.id ASC");
        assert_eq!(order_by_clause(Some("")), "f.created_at DESC, f.id ASC");
    }

    #[test]
    fn test_multiple_keys_and_directions() {
        assert_eq!(
            order_by_clause(Some("-rating,createdAt")),
            "f.rating DESC, f.created_at ASC, f.id ASC"
        );
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        assert_eq!(
            order_by_clause(Some("password;DROP TABLE users,-semester")),
            "f.semester DESC, f.id ASC"
        );
        assert_eq!(order_by_clause(Some("bogus")), "f.created_at DESC, f.id ASC");
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        assert_eq!(
            order_by_clause(Some("rating,-rating")),
            "f.rating ASC, f.id ASC"
        );
    }

    #[test]
    fn test_selected_fields() {
        assert_eq!(
            selected_fields(Some("subject, rating")),
            vec!["subject".to_string(), "rating".to_string()]
        );
        assert!(selected_fields(None).is_empty());
    }
}
