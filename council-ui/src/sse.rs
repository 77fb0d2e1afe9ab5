//! Server-Sent Events stream fed by the state file watcher.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use council::io::watcher::{StateWatcher, WatchOptions, watch_state};
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

#[derive(Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
}

impl From<ChangeEvent> for SsePayload {
    fn from(event: ChangeEvent) -> Self {
        match event {
            ChangeEvent::StateChanged => SsePayload {
                event_type: "state-changed",
            },
        }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    if let Ok(json) = serde_json::to_string(&SsePayload::from(change_event)) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Watch the service's state file and broadcast every debounced change.
///
/// The returned watcher must be kept alive for as long as events are wanted.
pub fn start_state_watcher(
    state: &AppState,
    options: &WatchOptions,
) -> anyhow::Result<StateWatcher> {
    let path = state.service.store().path().to_path_buf();
    let event_tx = state.event_tx.clone();
    let watcher = watch_state(&path, options, move || {
        // No subscribers is not an error.
        let receivers = event_tx.send(ChangeEvent::StateChanged).unwrap_or(0);
        debug!(receivers, "broadcasting state change");
        Ok(())
    })?;
    info!(path = %path.display(), "watching state file");
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use council::core::types::StartCouncil;
    use council::service::CouncilService;
    use council::test_support::temp_store;

    use super::*;

    #[test]
    fn payload_uses_kebab_case_type() {
        let json = serde_json::to_string(&SsePayload::from(ChangeEvent::StateChanged))
            .expect("serialize");
        assert_eq!(json, r#"{"type":"state-changed"}"#);
    }

    #[tokio::test]
    async fn write_to_state_file_is_broadcast() {
        let (_temp, store) = temp_store();
        let state = AppState::new(CouncilService::new(store));
        let mut rx = state.event_tx.subscribe();
        let options = WatchOptions {
            debounce: Duration::from_millis(20),
            poll_interval: Duration::from_millis(20),
        };
        let mut watcher = start_state_watcher(&state, &options).expect("watch");

        let service = state.service.clone();
        tokio::task::spawn_blocking(move || {
            service.start_council(&StartCouncil {
                request: "q".to_string(),
                agent_name: "alice".to_string(),
            })
        })
        .await
        .expect("join")
        .expect("start");

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("change within timeout")
            .expect("event");
        assert_eq!(event, ChangeEvent::StateChanged);
        watcher.close();
    }
}
