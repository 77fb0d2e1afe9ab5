//! Persisted council document and the values exchanged with the engine.
//!
//! The document is serialized with camelCase keys so that every process
//! sharing a state file reads and writes the same layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema tag written into every document.
pub const STATE_VERSION: u32 = 1;

/// The single shared document (`state.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilState {
    pub version: u32,
    pub session: Option<Session>,
    #[serde(default)]
    pub requests: Vec<Request>,
    /// Append-only; append order is the only ordering guarantee.
    #[serde(default)]
    pub feedback: Vec<Feedback>,
    /// Keyed by `agent_name`, stored in first-seen order.
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Default for CouncilState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            session: None,
            requests: Vec::new(),
            feedback: Vec::new(),
            participants: Vec::new(),
        }
    }
}

impl CouncilState {
    pub fn participant(&self, agent_name: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.agent_name == agent_name)
    }

    pub fn request(&self, request_id: &str) -> Option<&Request> {
        self.requests.iter().find(|request| request.id == request_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub current_request_id: Option<String>,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
}

impl Session {
    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub content: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    /// Back-reference to the request this answers.
    pub request_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub agent_name: String,
    pub last_seen: DateTime<Utc>,
    pub last_request_seen: Option<String>,
    pub last_feedback_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conclusion {
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Output of every engine transform: the document to persist plus the value
/// handed back to the caller once the write has landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<T> {
    pub next: CouncilState,
    pub result: T,
}

impl<T> Transition<T> {
    pub fn new(next: CouncilState, result: T) -> Self {
        Self { next, result }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCouncil {
    pub request: String,
    pub agent_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCouncilOutcome {
    pub agent_name: String,
    pub session: Session,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCouncil {
    pub agent_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub agent_name: String,
    /// Id of the last feedback entry the caller has already seen.
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub agent_name: String,
    pub session: Option<Session>,
    pub request: Option<Request>,
    pub feedback: Vec<Feedback>,
    pub participant: Participant,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub agent_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponseOutcome {
    pub agent_name: String,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseCouncil {
    pub agent_name: String,
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseCouncilOutcome {
    pub agent_name: String,
    pub session: Session,
    pub conclusion: Conclusion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutcome {
    pub cleared_session_id: Option<String>,
}
