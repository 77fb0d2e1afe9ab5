//! End-to-end council scenarios against a real state file.
//!
//! Every call goes through `CouncilService` -> `FileStateStore::update`, so
//! these exercise the lock, the atomic writer and the engine together.

use std::fs;

use council::core::error::CouncilError;
use council::core::invariants::validate_invariants;
use council::core::types::{
    CloseCouncil, CouncilState, JoinCouncil, RequestStatus, SendResponse, SessionQuery,
    SessionSnapshot, SessionStatus, StartCouncil,
};
use council::io::store::{CouncilStateStore, FileStateStore};
use council::service::CouncilService;
use council::test_support::temp_store;

fn start(service: &CouncilService, agent: &str, request: &str) -> String {
    service
        .start_council(&StartCouncil {
            request: request.to_string(),
            agent_name: agent.to_string(),
        })
        .expect("start council")
        .agent_name
}

fn respond(service: &CouncilService, agent: &str, content: &str) -> anyhow::Result<()> {
    service
        .send_response(&SendResponse {
            agent_name: agent.to_string(),
            content: content.to_string(),
        })
        .map(|_| ())
}

fn poll(service: &CouncilService, agent: &str, cursor: Option<&str>) -> SessionSnapshot {
    service
        .get_current_session_data(&SessionQuery {
            agent_name: agent.to_string(),
            cursor: cursor.map(str::to_string),
        })
        .expect("poll")
}

/// Happy path: start -> respond -> poll -> close -> late respond is rejected.
#[test]
fn happy_path_from_start_to_close() {
    let (_temp, store) = temp_store();
    let service = CouncilService::new(store);

    let agent = start(&service, "alice", "Should we ship v2?");
    assert_eq!(agent, "alice");

    let state = service.snapshot().expect("snapshot");
    let session = state.session.clone().expect("session");
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(state.requests[0].status, RequestStatus::Open);
    assert_eq!(state.requests[0].created_by, "alice");

    let response = service
        .send_response(&SendResponse {
            agent_name: "bob".to_string(),
            content: "Yes, metrics look good.".to_string(),
        })
        .expect("respond");
    assert_eq!(
        Some(response.feedback.request_id.as_str()),
        session.current_request_id.as_deref()
    );

    let snapshot = poll(&service, "carol", None);
    assert_eq!(snapshot.feedback.len(), 1);
    assert_eq!(snapshot.next_cursor.as_deref(), Some(response.feedback.id.as_str()));

    let closed = service
        .close_council(&CloseCouncil {
            agent_name: "alice".to_string(),
            conclusion: "Shipping v2.".to_string(),
        })
        .expect("close");
    assert_eq!(closed.session.status, SessionStatus::Closed);
    assert_eq!(closed.conclusion.content, "Shipping v2.");

    let state = service.snapshot().expect("snapshot");
    assert_eq!(state.requests[0].status, RequestStatus::Closed);
    assert!(validate_invariants(&state).is_empty());

    let err = respond(&service, "bob", "one more thing").expect_err("closed");
    assert!(matches!(
        err.downcast_ref::<CouncilError>(),
        Some(CouncilError::SessionAlreadyClosed(_))
    ));
    assert!(err.to_string().contains("closed"));
    assert_eq!(service.snapshot().expect("snapshot"), state);
}

/// Two independent store handles on one path behave like two processes:
/// the returning caller keeps its name, a newcomer gets the suffix.
#[test]
fn name_collision_between_processes() {
    let (_temp, store) = temp_store();
    let first = CouncilService::new(FileStateStore::new(store.path()));
    let second = CouncilService::new(FileStateStore::new(store.path()));

    start(&first, "alice", "Pick a database");

    let returning = poll(&second, "alice", None);
    assert_eq!(returning.agent_name, "alice");

    let newcomer = second
        .join_council(&JoinCouncil {
            agent_name: "alice".to_string(),
        })
        .expect("join");
    assert_eq!(newcomer.agent_name, "alice#1");

    let names: Vec<String> = first
        .snapshot()
        .expect("snapshot")
        .participants
        .into_iter()
        .map(|participant| participant.agent_name)
        .collect();
    assert_eq!(names, vec!["alice".to_string(), "alice#1".to_string()]);
}

/// Following `next_cursor` never returns an entry twice.
#[test]
fn cursor_polling_is_monotonic() {
    let (_temp, store) = temp_store();
    let service = CouncilService::new(store);
    start(&service, "alice", "Review the API");

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    for round in 0..4 {
        for author in ["bob", "dave"] {
            respond(&service, author, &format!("{author} round {round}")).expect("respond");
        }
        let snapshot = poll(&service, "carol", cursor.as_deref());
        assert_eq!(snapshot.feedback.len(), 2);
        for entry in &snapshot.feedback {
            assert!(!seen.contains(&entry.id), "duplicate feedback {}", entry.id);
            seen.push(entry.id.clone());
        }
        cursor = snapshot.next_cursor.clone();
    }

    let everything = poll(&service, "erin", None);
    assert_eq!(everything.feedback.len(), seen.len());
}

/// Starting again (after close) resets requests, feedback and participants.
#[test]
fn restart_discards_previous_session() {
    let (_temp, store) = temp_store();
    let service = CouncilService::new(store);
    start(&service, "alice", "first question");
    respond(&service, "bob", "answer").expect("respond");
    service
        .close_council(&CloseCouncil {
            agent_name: "alice".to_string(),
            conclusion: "settled".to_string(),
        })
        .expect("close");

    let outcome = service
        .start_council(&StartCouncil {
            request: "second question".to_string(),
            agent_name: "bob".to_string(),
        })
        .expect("restart");

    let state = service.snapshot().expect("snapshot");
    assert_eq!(state.requests, vec![outcome.request]);
    assert!(state.feedback.is_empty());
    assert_eq!(state.participants.len(), 1);
    assert_eq!(state.participants[0].agent_name, "bob");
    assert_eq!(state.session, Some(outcome.session));
}

/// The persisted file keeps the camelCase layout other processes expect.
#[test]
fn persisted_document_layout() {
    let (_temp, store) = temp_store();
    let service = CouncilService::new(FileStateStore::new(store.path()));
    start(&service, "alice", "layout check");

    let raw = fs::read_to_string(store.path()).expect("read state");
    assert!(raw.ends_with("}\n"));
    let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
    assert_eq!(value["version"], 1);
    assert_eq!(value["session"]["status"], "active");
    assert!(value["session"]["currentRequestId"].is_string());
    assert_eq!(value["requests"][0]["createdBy"], "alice");
    assert_eq!(value["participants"][0]["agentName"], "alice");

    let reloaded: CouncilState = store.load().expect("load");
    assert_eq!(reloaded, service.snapshot().expect("snapshot"));
}
