//! Council operations wired through the state store.
//!
//! Each method runs exactly one engine transform inside
//! [`CouncilStateStore::update`], so the read, the session rules and the write
//! happen under one lock. Front ends (CLI, HTTP) only talk to this type.

use anyhow::Result;
use tracing::info;

use crate::core::engine;
use crate::core::stamps::{Stamps, SystemStamps};
use crate::core::types::{
    CloseCouncil, CloseCouncilOutcome, CouncilState, JoinCouncil, ResetOutcome, SendResponse,
    SendResponseOutcome, SessionQuery, SessionSnapshot, StartCouncil, StartCouncilOutcome,
};
use crate::io::store::{CouncilStateStore, FileStateStore};

pub struct CouncilService<S = FileStateStore, C = SystemStamps> {
    store: S,
    stamps: C,
}

impl<S: CouncilStateStore> CouncilService<S, SystemStamps> {
    pub fn new(store: S) -> Self {
        Self::with_stamps(store, SystemStamps)
    }
}

impl<S: CouncilStateStore, C: Stamps> CouncilService<S, C> {
    pub fn with_stamps(store: S, stamps: C) -> Self {
        Self { store, stamps }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read-only view of the whole document.
    pub fn snapshot(&self) -> Result<CouncilState> {
        self.store.load()
    }

    pub fn start_council(&self, input: &StartCouncil) -> Result<StartCouncilOutcome> {
        let outcome = self
            .store
            .update(|state| Ok(engine::start_council(state, input, &self.stamps)?))?;
        info!(
            agent_name = %outcome.agent_name,
            session_id = %outcome.session.id,
            request_id = %outcome.request.id,
            "council started"
        );
        Ok(outcome)
    }

    pub fn join_council(&self, input: &JoinCouncil) -> Result<SessionSnapshot> {
        let snapshot = self
            .store
            .update(|state| Ok(engine::join_council(state, input, &self.stamps)?))?;
        info!(
            requested = %input.agent_name,
            agent_name = %snapshot.agent_name,
            "agent joined council"
        );
        Ok(snapshot)
    }

    pub fn get_current_session_data(&self, input: &SessionQuery) -> Result<SessionSnapshot> {
        self.store.update(|state| Ok(engine::get_current_session_data(state, input, &self.stamps)?))
    }

    pub fn send_response(&self, input: &SendResponse) -> Result<SendResponseOutcome> {
        let outcome = self
            .store
            .update(|state| Ok(engine::send_response(state, input, &self.stamps)?))?;
        info!(
            agent_name = %outcome.agent_name,
            feedback_id = %outcome.feedback.id,
            "feedback recorded"
        );
        Ok(outcome)
    }

    pub fn close_council(&self, input: &CloseCouncil) -> Result<CloseCouncilOutcome> {
        let outcome = self
            .store
            .update(|state| Ok(engine::close_council(state, input, &self.stamps)?))?;
        info!(
            agent_name = %outcome.agent_name,
            session_id = %outcome.session.id,
            "council closed"
        );
        Ok(outcome)
    }

    pub fn reset_council(&self) -> Result<ResetOutcome> {
        let outcome = self
            .store
            .update(|state| Ok(engine::reset_council(state)?))?;
        info!(cleared_session_id = ?outcome.cleared_session_id, "council reset");
        Ok(outcome)
    }
}
