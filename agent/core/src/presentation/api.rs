// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP binding of the protocol.
//!
//! | Method | Path                | Auth   |
//! |--------|---------------------|--------|
//! | POST   | `/ztap/v1/turn`     | Bearer |
//! | POST   | `/ztap/v1/followup` | Bearer |
//! | GET    | `/ztap/v1/manifest` | Bearer |
//! | GET    | `/health`           | none   |
//!
//! The agent credential is checked by middleware before any body is read, so
//! a bad credential is rejected whatever the body contains. Bodies are parsed
//! by the handlers so that malformed JSON is a `ValidationError` (400) in the
//! same envelope as every other failure:
//!
//! ```json
//! {"error": {"kind": "ValidationError", "message": "..."}, "new_state": null}
//! ```

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::application::bootstrap::AgentRuntime;
use crate::application::dialogue_engine::TurnReply;
use crate::domain::conversation::{ConversationState, DialoguePhase};
use crate::domain::credential::GateDecision;
use crate::domain::errors::ProtocolError;
use crate::domain::manifest::AgentManifest;
use crate::domain::task::SignedTask;

pub const USER_AUTH_HEADER: &str = "x-user-authorization";

pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
    pub start_time: std::time::Instant,
}

pub fn app(runtime: Arc<AgentRuntime>) -> Router {
    let state = Arc::new(AppState {
        runtime,
        start_time: std::time::Instant::now(),
    });

    let protected = Router::new()
        .route("/ztap/v1/turn", post(turn_handler))
        .route("/ztap/v1/followup", post(followup_handler))
        .route("/ztap/v1/manifest", get(manifest_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_credential));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub user_input: String,
    #[serde(default)]
    pub conversation_state: ConversationState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub new_state: ConversationState,
    pub response_text: Option<String>,
    pub signed_task: Option<SignedTask>,
    pub user_auth_token: Option<String>,
    pub phase: DialoguePhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowupRequest {
    #[serde(default = "empty_object")]
    pub task_results: Value,
    pub user_prompt: String,
    #[serde(default)]
    pub conversation_state: ConversationState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowupResponse {
    pub new_state: ConversationState,
    pub response_text: String,
}

fn empty_object() -> Value {
    json!({})
}

// ============================================================================
// Errors
// ============================================================================

/// Error envelope. `new_state` is the caller's own state, handed back unchanged.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    new_state: Option<ConversationState>,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "AuthorizationError",
            message: "missing or invalid agent credential".to_string(),
            new_state: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "ValidationError",
            message: message.into(),
            new_state: None,
        }
    }

    pub fn from_protocol(err: ProtocolError, state: ConversationState) -> Self {
        Self {
            status: status_for(&err),
            kind: err.kind(),
            message: err.to_string(),
            new_state: Some(state),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pub fn status_for(err: &ProtocolError) -> StatusCode {
    match err {
        ProtocolError::Authorization(_) => StatusCode::UNAUTHORIZED,
        ProtocolError::Validation(_) => StatusCode::BAD_REQUEST,
        ProtocolError::Oracle(_) => StatusCode::BAD_GATEWAY,
        ProtocolError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {"kind": self.kind, "message": self.message},
            "new_state": self.new_state,
        });
        (self.status, Json(body)).into_response()
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::validation(format!("invalid request body: {}", e)))
}

// ============================================================================
// Middleware & handlers
// ============================================================================

async fn require_credential(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match state.runtime.gate.check(presented) {
        GateDecision::Authorized => next.run(request).await,
        GateDecision::Denied => {
            metrics::counter!("ztap_auth_failures_total").increment(1);
            warn!(path = %request.uri().path(), "Rejected request with missing or invalid credential");
            ApiError::unauthorized().into_response()
        }
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "agent": state.runtime.manifest.metadata.name,
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn manifest_handler(State(state): State<Arc<AppState>>) -> Json<AgentManifest> {
    Json(state.runtime.protocol.manifest().clone())
}

async fn turn_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TurnResponse>, ApiError> {
    let request: TurnRequest = parse_body(&body)?;
    let user_auth_token = headers
        .get(USER_AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let outcome = state
        .runtime
        .protocol
        .advance_turn(request.conversation_state.clone(), &request.user_input, user_auth_token)
        .await
        .map_err(|e| ApiError::from_protocol(e, request.conversation_state))?;

    let (response_text, signed_task, user_auth_token) = match outcome.reply {
        TurnReply::Text(text) => (Some(text), None, None),
        TurnReply::Task {
            signed_task,
            user_auth_token,
        } => (None, Some(signed_task), user_auth_token),
    };

    Ok(Json(TurnResponse {
        new_state: outcome.new_state,
        response_text,
        signed_task,
        user_auth_token,
        phase: outcome.phase,
    }))
}

async fn followup_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FollowupResponse>, ApiError> {
    let request: FollowupRequest = parse_body(&body)?;

    let outcome = state
        .runtime
        .protocol
        .generate_followup(request.conversation_state.clone(), &request.task_results, &request.user_prompt)
        .await
        .map_err(|e| ApiError::from_protocol(e, request.conversation_state))?;

    Ok(Json(FollowupResponse {
        new_state: outcome.new_state,
        response_text: outcome.response_text,
    }))
}
