//! Shared application state for the UI server.

use std::sync::Arc;

use council::service::CouncilService;
use tokio::sync::broadcast;

/// Events broadcast to SSE clients when the state file changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    StateChanged,
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CouncilService>,
    /// Broadcast sender for state change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    pub fn new(service: CouncilService) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            service: Arc::new(service),
            event_tx: Arc::new(event_tx),
        }
    }
}
