//! Session-rule violations raised by the engine.

use thiserror::Error;

/// Caller-correctable rejections. The engine raises these before producing a
/// next document, so a rejected operation never writes anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouncilError {
    #[error("no active council session; start a council first")]
    NoActiveSession,
    #[error("council session {0} is closed")]
    SessionAlreadyClosed(String),
    #[error("council session has no current request")]
    NoCurrentRequest,
    #[error("request not found: {0}")]
    RequestNotFound(String),
}
