//! Structural checks over a council document.

use std::collections::HashSet;

use crate::core::types::{CouncilState, STATE_VERSION};

/// Validate document invariants. Returns a list of errors (empty if valid).
pub fn validate_invariants(state: &CouncilState) -> Vec<String> {
    let mut errors = Vec::new();

    if state.version != STATE_VERSION {
        errors.push(format!(
            "unsupported version {} (expected {})",
            state.version, STATE_VERSION
        ));
    }

    let mut request_ids = HashSet::new();
    for request in &state.requests {
        if !request_ids.insert(request.id.as_str()) {
            errors.push(format!("duplicate request id '{}'", request.id));
        }
    }

    if let Some(session) = &state.session {
        if let Some(current) = &session.current_request_id
            && !request_ids.contains(current.as_str())
        {
            errors.push(format!(
                "session '{}' references missing request '{}'",
                session.id, current
            ));
        }
        if session.is_closed() != session.conclusion.is_some() {
            errors.push(format!(
                "session '{}' must carry a conclusion exactly when closed",
                session.id
            ));
        }
    }

    let mut feedback_ids = HashSet::new();
    for entry in &state.feedback {
        if !feedback_ids.insert(entry.id.as_str()) {
            errors.push(format!("duplicate feedback id '{}'", entry.id));
        }
        if !request_ids.contains(entry.request_id.as_str()) {
            errors.push(format!(
                "feedback '{}' references missing request '{}'",
                entry.id, entry.request_id
            ));
        }
    }

    let mut names = HashSet::new();
    for participant in &state.participants {
        if !names.insert(participant.agent_name.as_str()) {
            errors.push(format!("duplicate agent name '{}'", participant.agent_name));
        }
    }

    errors
}
