//! Shared-file coordination for agent councils.
//!
//! Independent processes (CLI invocations, a tool server, a local web server)
//! cooperate on one JSON document: an agent opens a request, others join and
//! post feedback, and someone closes the session with a conclusion.
//!
//! - **[`core`]**: Pure session rules (engine, name assignment, cursors).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Path resolution, the lock file, atomic writes, the state
//!   store, configuration and the change watcher.
//!
//! [`service::CouncilService`] composes the two; front ends call it.

pub mod core;
pub mod exit_codes;
pub mod input;
pub mod io;
pub mod logging;
pub mod render;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
