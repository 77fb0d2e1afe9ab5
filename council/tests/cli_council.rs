//! CLI tests for the `council` binary.
//!
//! Spawns real processes against a temp state file and checks exit codes,
//! JSON output and cross-process serialization.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;

use council::core::invariants::validate_invariants;
use council::exit_codes;
use council::io::path::{config_path_for, lock_path_for};
use council::io::store::{CouncilStateStore, FileStateStore};

fn council(state_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_council"))
        .arg("--state-path")
        .arg(state_path)
        .args(args)
        .env_remove("AGENTS_COUNCIL_STATE_PATH")
        .output()
        .expect("run council")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "council failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json output")
}

/// Run with `--format json` and parse stdout; the command must succeed.
fn council_json(state_path: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--format", "json"];
    full.extend_from_slice(args);
    json(&council(state_path, &full))
}

#[test]
fn lifecycle_exit_codes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");

    let out = council(&state_path, &["respond", "-n", "bob", "too early"]);
    assert_eq!(out.status.code(), Some(exit_codes::REJECTED));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no active council session"));

    let out = council(&state_path, &["start", "-n", "   ", "question"]);
    assert_eq!(out.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&out.stderr).contains("\"agent_name\" is required"));

    let started = council_json(&state_path, &["start", "-n", "alice", "Ship v2?"]);
    assert_eq!(started["agentName"], "alice");
    assert_eq!(started["session"]["status"], "active");

    let joined = council_json(&state_path, &["join", "-n", "alice"]);
    assert_eq!(joined["agentName"], "alice#1");
    assert_eq!(joined["request"]["content"], "Ship v2?");

    let out = council(&state_path, &["respond", "-n", "alice#1", "yes"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));

    let out = council(&state_path, &["close", "-n", "alice", "Shipping."]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));

    let out = council(&state_path, &["respond", "-n", "bob", "late"]);
    assert_eq!(out.status.code(), Some(exit_codes::REJECTED));

    let out = council(&state_path, &["check"]);
    assert_eq!(out.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\n");
}

#[test]
fn status_follows_the_cursor() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");
    council_json(&state_path, &["start", "-n", "alice", "q"]);
    council_json(&state_path, &["respond", "-n", "bob", "first"]);

    let first = council_json(&state_path, &["status", "-n", "carol"]);
    assert_eq!(first["feedback"].as_array().expect("feedback").len(), 1);
    let cursor = first["nextCursor"].as_str().expect("cursor").to_string();

    council_json(&state_path, &["respond", "-n", "bob", "second"]);
    let second = council_json(&state_path, &["status", "-n", "carol", "--cursor", &cursor]);
    let feedback = second["feedback"].as_array().expect("feedback");
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0]["content"], "second");
}

#[test]
fn held_lock_times_out_with_locked_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");
    fs::write(
        config_path_for(&state_path),
        "[lock]\nmax_wait_ms = 200\nretry_delay_ms = 20\n",
    )
    .expect("write config");
    fs::write(
        lock_path_for(&state_path),
        r#"{"pid":1,"createdAt":"2026-01-01T00:00:00Z"}"#,
    )
    .expect("hold lock");

    let out = council(&state_path, &["start", "-n", "alice", "q"]);
    assert_eq!(out.status.code(), Some(exit_codes::LOCKED));
    assert!(!state_path.exists());
}

#[test]
fn reset_clears_the_document() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");
    let started = council_json(&state_path, &["start", "-n", "alice", "q"]);

    let reset = council_json(&state_path, &["reset"]);
    assert_eq!(reset["clearedSessionId"], started["session"]["id"]);

    let shown = council_json(&state_path, &["show"]);
    assert!(shown["session"].is_null());
    assert_eq!(shown["requests"].as_array().expect("requests").len(), 0);
}

#[test]
fn concurrent_processes_do_not_lose_responses() {
    const PROCESSES: usize = 6;

    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");
    council_json(&state_path, &["start", "-n", "host", "q"]);

    let handles: Vec<_> = (0..PROCESSES)
        .map(|n| {
            let state_path = state_path.clone();
            thread::spawn(move || {
                let agent = format!("agent-{n}");
                let content = format!("reply {n}");
                council(&state_path, &["respond", "-n", &agent, &content])
            })
        })
        .collect();
    for handle in handles {
        let out = handle.join().expect("process thread");
        assert_eq!(
            out.status.code(),
            Some(exit_codes::OK),
            "{}",
            String::from_utf8_lossy(&out.stderr)
        );
    }

    let state = FileStateStore::new(&state_path).load().expect("load");
    assert_eq!(state.feedback.len(), PROCESSES);
    assert_eq!(state.participants.len(), PROCESSES + 1);
    assert!(validate_invariants(&state).is_empty());
    assert!(!lock_path_for(&state_path).exists());
}
