//! Plain-text rendering of operation results for terminal output.

use std::fmt::Write as _;

use crate::core::types::{
    CloseCouncilOutcome, CouncilState, Feedback, Request, ResetOutcome, SendResponseOutcome,
    Session, SessionSnapshot, SessionStatus, StartCouncilOutcome,
};

pub fn start_outcome(outcome: &StartCouncilOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "agent_name: {}", outcome.agent_name);
    let _ = writeln!(out, "session: {}", outcome.session.id);
    push_request(&mut out, &outcome.request);
    out
}

pub fn snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "agent_name: {}", snapshot.agent_name);
    match &snapshot.session {
        Some(session) => push_session(&mut out, session),
        None => out.push_str("session: none\n"),
    }
    if let Some(request) = &snapshot.request {
        push_request(&mut out, request);
    }
    if snapshot.feedback.is_empty() {
        out.push_str("no new feedback\n");
    }
    for entry in &snapshot.feedback {
        push_feedback(&mut out, entry);
    }
    let _ = writeln!(
        out,
        "next_cursor: {}",
        snapshot.next_cursor.as_deref().unwrap_or("none")
    );
    out
}

pub fn response_outcome(outcome: &SendResponseOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "agent_name: {}", outcome.agent_name);
    push_feedback(&mut out, &outcome.feedback);
    out
}

pub fn close_outcome(outcome: &CloseCouncilOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "agent_name: {}", outcome.agent_name);
    push_session(&mut out, &outcome.session);
    out
}

pub fn reset_outcome(outcome: &ResetOutcome) -> String {
    match &outcome.cleared_session_id {
        Some(id) => format!("cleared session {id}\n"),
        None => "no session to clear\n".to_string(),
    }
}

pub fn state_summary(state: &CouncilState) -> String {
    let mut out = String::new();
    match &state.session {
        Some(session) => push_session(&mut out, session),
        None => out.push_str("session: none\n"),
    }
    for request in &state.requests {
        push_request(&mut out, request);
    }
    for entry in &state.feedback {
        push_feedback(&mut out, entry);
    }
    let names: Vec<&str> = state
        .participants
        .iter()
        .map(|participant| participant.agent_name.as_str())
        .collect();
    let _ = writeln!(out, "participants: {}", names.join(", "));
    out
}

fn push_session(out: &mut String, session: &Session) {
    let status = match session.status {
        SessionStatus::Active => "active",
        SessionStatus::Closed => "closed",
    };
    let _ = writeln!(out, "session: {} ({status})", session.id);
    if let Some(conclusion) = &session.conclusion {
        let _ = writeln!(
            out,
            "conclusion by {}: {}",
            conclusion.author, conclusion.content
        );
    }
}

fn push_request(out: &mut String, request: &Request) {
    let _ = writeln!(
        out,
        "request {} from {}: {}",
        request.id, request.created_by, request.content
    );
}

fn push_feedback(out: &mut String, entry: &Feedback) {
    let _ = writeln!(out, "- [{}] {}: {}", entry.id, entry.author, entry.content);
}
