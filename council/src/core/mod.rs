//! Deterministic, pure council logic.
//!
//! Core modules must be free of I/O side effects. They operate on an owned
//! [`types::CouncilState`] and return the next document, so the store can run
//! them inside its critical section and tests can run them without a disk.

pub mod cursor;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod names;
pub mod stamps;
pub mod types;
