//! Boundary validation for text handed to the engine.
//!
//! The engine trusts its inputs; front ends call these before building an
//! operation so that names and content always arrive trimmed and non-empty.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("\"{0}\" is required")]
    Missing(String),
}

/// Trimmed `value`, or [`InputError::Missing`] when nothing is left.
pub fn require_text(field: &str, value: &str) -> Result<String, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trimmed `value`; blank counts as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(require_text("agent_name", "  alice \n"), Ok("alice".to_string()));
    }

    #[test]
    fn blank_required_text_names_the_field() {
        let err = require_text("content", "   ").expect_err("blank");
        assert_eq!(err.to_string(), "\"content\" is required");
    }

    #[test]
    fn blank_optional_text_is_absent() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" f-1 ")), Some("f-1".to_string()));
        assert_eq!(optional_text(None), None);
    }
}
