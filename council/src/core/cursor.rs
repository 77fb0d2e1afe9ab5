//! Incremental feedback polling.

use crate::core::types::Feedback;

/// Entries strictly after `cursor`.
///
/// No cursor, or a cursor that no longer matches any entry (the session was
/// replaced since it was issued), yields every entry.
pub fn feedback_after<'a>(feedback: &'a [Feedback], cursor: Option<&str>) -> &'a [Feedback] {
    let Some(cursor) = cursor else {
        return feedback;
    };
    match feedback.iter().position(|entry| entry.id == cursor) {
        Some(index) => &feedback[index + 1..],
        None => feedback,
    }
}

/// Id of the last returned entry, or the incoming cursor when nothing is new.
pub fn next_cursor(returned: &[Feedback], cursor: Option<&str>) -> Option<String> {
    returned
        .last()
        .map(|entry| entry.id.clone())
        .or_else(|| cursor.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn entry(id: &str) -> Feedback {
        Feedback {
            id: id.to_string(),
            request_id: "r-1".to_string(),
            author: "bob".to_string(),
            content: format!("{id} content"),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    fn ids(entries: &[Feedback]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn no_cursor_returns_everything() {
        let feedback = vec![entry("a"), entry("b")];
        assert_eq!(ids(feedback_after(&feedback, None)), vec!["a", "b"]);
    }

    #[test]
    fn cursor_skips_seen_entries() {
        let feedback = vec![entry("a"), entry("b"), entry("c")];
        assert_eq!(ids(feedback_after(&feedback, Some("a"))), vec!["b", "c"]);
        assert!(feedback_after(&feedback, Some("c")).is_empty());
    }

    #[test]
    fn unknown_cursor_returns_everything() {
        let feedback = vec![entry("a")];
        assert_eq!(ids(feedback_after(&feedback, Some("gone"))), vec!["a"]);
    }

    #[test]
    fn next_cursor_keeps_input_when_nothing_new() {
        assert_eq!(next_cursor(&[], Some("a")), Some("a".to_string()));
        assert_eq!(next_cursor(&[], None), None);
        assert_eq!(
            next_cursor(&[entry("b"), entry("c")], Some("a")),
            Some("c".to_string())
        );
    }
}
