//! Chat, Health and WebSocket Handlers

use axum::{
    Json,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    http::StatusCode,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use agent_core::{AgentError, Message, SessionId};
use agent_runtime::paced_fragments;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

fn default_session() -> String {
    "default".into()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default = "default_session")]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub message: &'static str,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<String>,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn agent_failure(session_id: &str, err: &AgentError) -> ApiError {
    tracing::error!(session = session_id, error = %err, "Agent turn failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Failed to process message".into(),
            details: Some(err.user_message()),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        llm_connected,
    })
}

/// Run one chat turn for a session
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Message is required")),
            )
        })?;

    let agent = state
        .sessions
        .get_or_create(&SessionId::from(payload.session_id.as_str()));
    let response = agent
        .lock()
        .await
        .send_message(&message)
        .await
        .map_err(|e| agent_failure(&payload.session_id, &e))?;

    Ok(Json(ChatResponse {
        response,
        session_id: payload.session_id,
    }))
}

/// Opening greeting for a session
pub async fn greeting_handler(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let agent = state
        .sessions
        .get_or_create(&SessionId::from(payload.session_id.as_str()));
    let response = agent
        .lock()
        .await
        .initial_greeting()
        .await
        .map_err(|e| agent_failure(&payload.session_id, &e))?;

    Ok(Json(ChatResponse {
        response,
        session_id: payload.session_id,
    }))
}

/// Reset a session's conversation; unknown sessions are left alone
pub async fn reset_handler(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Json<ResetResponse> {
    if let Some(agent) = state
        .sessions
        .get(&SessionId::from(payload.session_id.as_str()))
    {
        agent.lock().await.reset();
        tracing::info!(session = %payload.session_id, "Conversation reset");
    }

    Json(ResetResponse {
        message: "Conversation reset successfully",
        session_id: payload.session_id,
    })
}

/// Conversation history without the system prompt
pub async fn history_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let agent = state
        .sessions
        .get(&SessionId::from(session_id.as_str()))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Session not found")),
            )
        })?;
    let messages = agent.lock().await.history();

    Ok(Json(HistoryResponse {
        session_id,
        messages,
    }))
}

/// Live session ids, oldest first
pub async fn sessions_handler(State(state): State<AppState>) -> Json<SessionsResponse> {
    let sessions: Vec<String> = state
        .sessions
        .ids()
        .into_iter()
        .map(|id| id.to_string())
        .collect();

    Json(SessionsResponse {
        count: sessions.len(),
        sessions,
    })
}

/// WebSocket chat with paced reply fragments
pub async fn chat_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Err(e) => {
                tracing::error!(error = %e, "WebSocket error");
                break;
            }
            _ => continue,
        };

        let request: ChatRequest = match serde_json::from_str(msg.as_str()) {
            Ok(r) => r,
            Err(e) => {
                let frame = serde_json::json!({"type": "error", "error": e.to_string()});
                if sender.send(WsMessage::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
                continue;
            }
        };
        let Some(text) = request.message.filter(|m| !m.trim().is_empty()) else {
            let frame = serde_json::json!({"type": "error", "error": "Message is required"});
            if sender.send(WsMessage::Text(frame.to_string().into())).await.is_err() {
                break;
            }
            continue;
        };

        let agent = state
            .sessions
            .get_or_create(&SessionId::from(request.session_id.as_str()));
        let reply = agent.lock().await.send_message(&text).await;

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(session = %request.session_id, error = %e, "Agent turn failed");
                let frame = serde_json::json!({"type": "error", "error": e.user_message()});
                if sender.send(WsMessage::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let mut fragments = std::pin::pin!(paced_fragments(&reply, state.fragment_delay));
        let mut delivered = true;
        while let Some(content) = fragments.next().await {
            let frame = serde_json::json!({"type": "chunk", "content": content});
            if sender.send(WsMessage::Text(frame.to_string().into())).await.is_err() {
                delivered = false;
                break;
            }
        }
        if !delivered {
            break;
        }

        let done = serde_json::json!({"type": "done", "sessionId": request.session_id});
        if sender.send(WsMessage::Text(done.to_string().into())).await.is_err() {
            break;
        }
    }
}
