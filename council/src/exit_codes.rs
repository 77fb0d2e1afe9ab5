//! Stable exit codes for council CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid input, unreadable/malformed state, or any other failure.
pub const INVALID: i32 = 1;
/// The session rules rejected the operation (no session, session closed, ...).
pub const REJECTED: i32 = 2;
/// Timed out waiting for the state lock; the operation may be retried.
pub const LOCKED: i32 = 3;
