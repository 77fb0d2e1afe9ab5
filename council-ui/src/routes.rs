//! HTTP route handlers for the council API.
//!
//! Every operation runs on the blocking pool: the store waits on a lock file
//! and does synchronous file I/O.

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use council::core::error::CouncilError;
use council::core::types::{
    CloseCouncil, CouncilState, JoinCouncil, SendResponse, SessionQuery, StartCouncil,
};
use council::input::{InputError, optional_text, require_text};
use council::io::lock::LockError;
use council::service::CouncilService;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// Council operations, mounted at the root.
pub fn council_router() -> Router<AppState> {
    Router::new()
        .route("/start-council", post(start_council))
        .route("/join-council", post(join_council))
        .route("/get-current-session-data", post(get_current_session_data))
        .route("/send-response", post(send_response))
        .route("/close-council", post(close_council))
        .route("/reset-council", post(reset_council))
}

/// Read-only API, mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
}

/// JSON error body `{"error": message}` with a status derived from the cause.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = if err.downcast_ref::<CouncilError>().is_some() {
            StatusCode::CONFLICT
        } else if matches!(err.downcast_ref::<LockError>(), Some(LockError::Timeout { .. })) {
            StatusCode::SERVICE_UNAVAILABLE
        } else if err.downcast_ref::<InputError>().is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let message = format!("{err:#}");
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!(error = %message, "council operation failed");
        }
        Self { status, message }
    }
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run a service call on the blocking pool.
async fn blocking<T, F>(state: &AppState, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&CouncilService) -> anyhow::Result<T> + Send + 'static,
{
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| ApiError::from(anyhow::Error::new(err)))?;
    Ok(Json(outcome?))
}

#[derive(Deserialize)]
struct StartBody {
    request: String,
    agent_name: String,
}

#[derive(Deserialize)]
struct AgentBody {
    agent_name: String,
}

#[derive(Deserialize)]
struct QueryBody {
    agent_name: String,
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct ResponseBody {
    agent_name: String,
    content: String,
}

#[derive(Deserialize)]
struct CloseBody {
    agent_name: String,
    conclusion: String,
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/state - the whole council document.
async fn get_state(State(state): State<AppState>) -> ApiResult<CouncilState> {
    blocking(&state, |service| service.snapshot()).await
}

async fn start_council(
    State(state): State<AppState>,
    body: Result<Json<StartBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = StartCouncil {
        request: require_text("request", &body.request)?,
        agent_name: require_text("agent_name", &body.agent_name)?,
    };
    blocking(&state, move |service| service.start_council(&input)).await
}

async fn join_council(
    State(state): State<AppState>,
    body: Result<Json<AgentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = JoinCouncil {
        agent_name: require_text("agent_name", &body.agent_name)?,
    };
    blocking(&state, move |service| service.join_council(&input)).await
}

async fn get_current_session_data(
    State(state): State<AppState>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = SessionQuery {
        agent_name: require_text("agent_name", &body.agent_name)?,
        cursor: optional_text(body.cursor.as_deref()),
    };
    blocking(&state, move |service| service.get_current_session_data(&input)).await
}

async fn send_response(
    State(state): State<AppState>,
    body: Result<Json<ResponseBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = SendResponse {
        agent_name: require_text("agent_name", &body.agent_name)?,
        content: require_text("content", &body.content)?,
    };
    blocking(&state, move |service| service.send_response(&input)).await
}

async fn close_council(
    State(state): State<AppState>,
    body: Result<Json<CloseBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let input = CloseCouncil {
        agent_name: require_text("agent_name", &body.agent_name)?,
        conclusion: require_text("conclusion", &body.conclusion)?,
    };
    blocking(&state, move |service| service.close_council(&input)).await
}

async fn reset_council(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    blocking(&state, |service| service.reset_council()).await
}
