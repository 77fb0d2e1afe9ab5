//! Council session state machine.
//!
//! Every operation is a pure transform: it takes the current document by
//! value, returns the next document together with the caller-facing result,
//! and raises [`CouncilError`] before anything is produced when the session
//! rules reject the call.
//!
//! Session lifecycle: `absent -> active` on start, `active -> closed` on close.
//! Closed is terminal; the next start builds a brand-new session.

use crate::core::cursor::{feedback_after, next_cursor};
use crate::core::error::CouncilError;
use crate::core::names::{NameClaim, resolve_agent_name, upsert_participant};
use crate::core::stamps::Stamps;
use crate::core::types::{
    CloseCouncil, CloseCouncilOutcome, Conclusion, CouncilState, Feedback, JoinCouncil, Request,
    RequestStatus, ResetOutcome, SendResponse, SendResponseOutcome, Session, SessionQuery,
    SessionSnapshot, SessionStatus, StartCouncil, StartCouncilOutcome, Transition,
};

/// Open a new council, discarding whatever the document held before.
pub fn start_council(
    _state: CouncilState,
    input: &StartCouncil,
    stamps: &impl Stamps,
) -> Result<Transition<StartCouncilOutcome>, CouncilError> {
    let now = stamps.now();
    let mut next = CouncilState::default();
    let agent_name = resolve_agent_name(&next.participants, &input.agent_name, NameClaim::Newcomer);

    let request = Request {
        id: stamps.new_id(),
        content: input.request.clone(),
        created_by: agent_name.clone(),
        created_at: now,
        status: RequestStatus::Open,
    };
    let session = Session {
        id: stamps.new_id(),
        status: SessionStatus::Active,
        created_at: now,
        current_request_id: Some(request.id.clone()),
        conclusion: None,
    };

    upsert_participant(&mut next.participants, &agent_name, now, |participant| {
        participant.last_request_seen = Some(request.id.clone());
    });
    next.session = Some(session.clone());
    next.requests.push(request.clone());

    Ok(Transition::new(
        next,
        StartCouncilOutcome {
            agent_name,
            session,
            request,
        },
    ))
}

/// Snapshot of the session for a caller that already owns `agent_name`.
pub fn get_current_session_data(
    state: CouncilState,
    input: &SessionQuery,
    stamps: &impl Stamps,
) -> Result<Transition<SessionSnapshot>, CouncilError> {
    snapshot(
        state,
        &input.agent_name,
        NameClaim::Returning,
        input.cursor.as_deref(),
        stamps,
    )
}

/// Enter the session as a new identity; a taken name is suffixed.
pub fn join_council(
    state: CouncilState,
    input: &JoinCouncil,
    stamps: &impl Stamps,
) -> Result<Transition<SessionSnapshot>, CouncilError> {
    snapshot(state, &input.agent_name, NameClaim::Newcomer, None, stamps)
}

fn snapshot(
    mut state: CouncilState,
    requested_name: &str,
    claim: NameClaim,
    cursor: Option<&str>,
    stamps: &impl Stamps,
) -> Result<Transition<SessionSnapshot>, CouncilError> {
    let now = stamps.now();
    let agent_name = resolve_agent_name(&state.participants, requested_name, claim);
    let request = current_request(&state)?.cloned();
    let feedback = feedback_after(&state.feedback, cursor).to_vec();
    let next_cursor = next_cursor(&feedback, cursor);

    let participant = upsert_participant(&mut state.participants, &agent_name, now, |participant| {
        if let Some(request) = &request {
            participant.last_request_seen = Some(request.id.clone());
        }
        participant.last_feedback_seen = next_cursor.clone();
    });

    let result = SessionSnapshot {
        agent_name,
        session: state.session.clone(),
        request,
        feedback,
        participant,
        next_cursor,
    };
    Ok(Transition::new(state, result))
}

/// Append feedback to the current request.
pub fn send_response(
    mut state: CouncilState,
    input: &SendResponse,
    stamps: &impl Stamps,
) -> Result<Transition<SendResponseOutcome>, CouncilError> {
    ensure_active(&state)?;
    let request_id = current_request(&state)?
        .map(|request| request.id.clone())
        .ok_or(CouncilError::NoCurrentRequest)?;

    let now = stamps.now();
    let agent_name =
        resolve_agent_name(&state.participants, &input.agent_name, NameClaim::Returning);
    let feedback = Feedback {
        id: stamps.new_id(),
        request_id: request_id.clone(),
        author: agent_name.clone(),
        content: input.content.clone(),
        created_at: now,
    };

    upsert_participant(&mut state.participants, &agent_name, now, |participant| {
        participant.last_request_seen = Some(request_id);
        participant.last_feedback_seen = Some(feedback.id.clone());
    });
    state.feedback.push(feedback.clone());

    Ok(Transition::new(
        state,
        SendResponseOutcome {
            agent_name,
            feedback,
        },
    ))
}

/// Close the session with a conclusion. Terminal.
pub fn close_council(
    mut state: CouncilState,
    input: &CloseCouncil,
    stamps: &impl Stamps,
) -> Result<Transition<CloseCouncilOutcome>, CouncilError> {
    ensure_active(&state)?;
    // A current request id that no longer resolves does not block closing.
    let request_id = state
        .session
        .as_ref()
        .and_then(|session| session.current_request_id.clone())
        .filter(|request_id| state.request(request_id).is_some());

    let now = stamps.now();
    let agent_name =
        resolve_agent_name(&state.participants, &input.agent_name, NameClaim::Returning);
    let conclusion = Conclusion {
        author: agent_name.clone(),
        content: input.conclusion.clone(),
        created_at: now,
    };

    if let Some(request_id) = &request_id
        && let Some(request) = state.requests.iter_mut().find(|request| &request.id == request_id)
    {
        request.status = RequestStatus::Closed;
    }

    let session = {
        let Some(session) = state.session.as_mut() else {
            return Err(CouncilError::NoActiveSession);
        };
        session.status = SessionStatus::Closed;
        session.conclusion = Some(conclusion.clone());
        session.clone()
    };

    upsert_participant(&mut state.participants, &agent_name, now, |participant| {
        if request_id.is_some() {
            participant.last_request_seen = request_id.clone();
        }
    });

    Ok(Transition::new(
        state,
        CloseCouncilOutcome {
            agent_name,
            session,
            conclusion,
        },
    ))
}

/// Drop the session and everything attached to it.
pub fn reset_council(state: CouncilState) -> Result<Transition<ResetOutcome>, CouncilError> {
    let cleared_session_id = state.session.map(|session| session.id);
    Ok(Transition::new(
        CouncilState {
            version: state.version,
            ..CouncilState::default()
        },
        ResetOutcome { cleared_session_id },
    ))
}

fn ensure_active(state: &CouncilState) -> Result<(), CouncilError> {
    match &state.session {
        None => Err(CouncilError::NoActiveSession),
        Some(session) if session.is_closed() => {
            Err(CouncilError::SessionAlreadyClosed(session.id.clone()))
        }
        Some(_) => Ok(()),
    }
}

/// The request referenced by `session.currentRequestId`, if any.
fn current_request(state: &CouncilState) -> Result<Option<&Request>, CouncilError> {
    let Some(request_id) = state
        .session
        .as_ref()
        .and_then(|session| session.current_request_id.as_deref())
    else {
        return Ok(None);
    };
    state
        .request(request_id)
        .map(Some)
        .ok_or_else(|| CouncilError::RequestNotFound(request_id.to_string()))
}
