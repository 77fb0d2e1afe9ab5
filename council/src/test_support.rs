//! Test-only helpers: deterministic stamps, an in-memory store, fixtures.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::core::engine::start_council;
use crate::core::stamps::Stamps;
use crate::core::types::{CouncilState, StartCouncil, Transition};
use crate::io::store::{CouncilStateStore, FileStateStore};

/// Every call advances a shared counter: ids are `id-0001`, `id-0002`, ...
/// and timestamps move forward one second per call.
#[derive(Debug, Default)]
pub struct FixedStamps {
    counter: AtomicU64,
}

impl FixedStamps {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Stamps for FixedStamps {
    fn now(&self) -> DateTime<Utc> {
        let base = DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000);
        base + Duration::seconds(self.tick() as i64)
    }

    fn new_id(&self) -> String {
        format!("id-{:04}", self.tick())
    }
}

/// Store that keeps the document in memory, for service-level tests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<CouncilState>,
}

impl MemoryStateStore {
    pub fn with_state(state: CouncilState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl CouncilStateStore for MemoryStateStore {
    fn load(&self) -> Result<CouncilState> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn update<T, F>(&self, transform: F) -> Result<T>
    where
        F: FnOnce(CouncilState) -> Result<Transition<T>>,
    {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let Transition { next, result } = transform(guard.clone())?;
        *guard = next;
        Ok(result)
    }
}

/// Document holding a freshly started council.
pub fn started_state(stamps: &FixedStamps, agent_name: &str, request: &str) -> CouncilState {
    let input = StartCouncil {
        request: request.to_string(),
        agent_name: agent_name.to_string(),
    };
    start_council(CouncilState::default(), &input, stamps)
        .expect("start council fixture")
        .next
}

/// File store inside a fresh temporary directory. Keep the `TempDir` alive.
pub fn temp_store() -> (tempfile::TempDir, FileStateStore) {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = FileStateStore::new(temp.path().join(".agents-council").join("state.json"));
    (temp, store)
}
