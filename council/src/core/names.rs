//! Agent-name assignment and participant bookkeeping.
//!
//! There is no session token: the name handed back by the engine *is* the
//! caller's identity, and callers must reuse it on every later call.

use chrono::{DateTime, Utc};

use crate::core::types::Participant;

/// How a caller relates to the name it asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClaim {
    /// The caller already owns (or is registering) this exact name. An
    /// existing participant of that name is reused.
    Returning,
    /// A new identity entering the session. A taken name is suffixed with the
    /// first free `#n`.
    Newcomer,
}

/// Resolve the effective agent name for `requested` against `participants`.
pub fn resolve_agent_name(
    participants: &[Participant],
    requested: &str,
    claim: NameClaim,
) -> String {
    match claim {
        NameClaim::Returning => requested.to_string(),
        NameClaim::Newcomer => first_free_name(participants, requested),
    }
}

/// `base` when free, otherwise `base#1`, `base#2`, ... whichever is free first.
pub fn first_free_name(participants: &[Participant], base: &str) -> String {
    if !is_taken(participants, base) {
        return base.to_string();
    }
    let mut suffix = 1u32;
    loop {
        let candidate = format!("{base}#{suffix}");
        if !is_taken(participants, &candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn is_taken(participants: &[Participant], name: &str) -> bool {
    participants
        .iter()
        .any(|participant| participant.agent_name == name)
}

/// Insert or update the participant named `agent_name`, stamping `last_seen`
/// and applying `apply` to the record. Returns the stored record.
pub fn upsert_participant(
    participants: &mut Vec<Participant>,
    agent_name: &str,
    now: DateTime<Utc>,
    apply: impl FnOnce(&mut Participant),
) -> Participant {
    let index = match participants
        .iter()
        .position(|participant| participant.agent_name == agent_name)
    {
        Some(index) => index,
        None => {
            participants.push(Participant {
                agent_name: agent_name.to_string(),
                last_seen: now,
                last_request_seen: None,
                last_feedback_seen: None,
            });
            participants.len() - 1
        }
    };
    let participant = &mut participants[index];
    participant.last_seen = now;
    apply(participant);
    participant.clone()
}
