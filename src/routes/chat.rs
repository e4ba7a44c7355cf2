use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::agent::{AgentError, AgentMode};
use crate::server::AppState;
use crate::session::ChatMessage;

/// Request body for `POST /api/chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub responses: Vec<ChatMessage>,
}

type ApiError = (StatusCode, ResponseJson<Value>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, ResponseJson(json!({ "error": message })))
}

/// Chat endpoint handler.
///
/// Runs one turn of the tool-calling agent for a session and returns every
/// message the turn produced. The session's history is only extended when
/// the turn succeeds.
///
/// # Route
/// - **Method**: POST
/// - **Path**: `/api/chat`
///
/// # Request Format
/// ```json
/// {
///   "sessionId": "abc123",
///   "message": "quote 0.1 SOL to USDC",
///   "mode": "OKX_API_AGENT_NLP"
/// }
/// ```
/// `mode` is `SAK_AGENT_NLP` (swap copilot) or `OKX_API_AGENT_NLP` (full API agent).
///
/// # Response Format
/// ```json
/// {
///   "responses": [
///     { "role": "tool", "content": "{...}", "tool_call_id": "call_1", "name": "okx_get_quote" },
///     { "role": "assistant", "content": "0.1 SOL is about 17.2 USDC." }
///   ]
/// }
/// ```
///
/// # HTTP Status Codes
/// - **200 OK**: the turn completed
/// - **400 Bad Request**: missing `sessionId`, missing `message`, unknown `mode`
///   or a body that is not JSON; checked in that order
/// - **500 Internal Server Error**: the model call failed; `error` carries the
///   message and `details` the debug form
///
/// # Examples
/// ```bash
/// curl -X POST http://localhost:3001/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"sessionId":"s1","message":"list chains","mode":"OKX_API_AGENT_NLP"}'
/// ```
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ResponseJson<ChatResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected chat request body: {}", rejection.body_text());
        (
            StatusCode::BAD_REQUEST,
            ResponseJson(json!({ "error": "Invalid request body", "details": rejection.body_text() })),
        )
    })?;

    let session_id = request
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("SessionId is required"))?;
    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| bad_request("Message is required for NLP modes"))?;
    let mode = request
        .mode
        .as_deref()
        .and_then(AgentMode::parse)
        .ok_or_else(|| bad_request("Valid mode (SAK_AGENT_NLP or OKX_API_AGENT_NLP) is required"))?;

    info!("Chat request: mode={}, session={}", mode.as_str(), session_id);

    match state.chat.handle_turn(&session_id, &message, mode).await {
        Ok(responses) => Ok(ResponseJson(ChatResponse { responses })),
        Err(e) => {
            error!("Error processing {} request for session {}: {}", mode.as_str(), session_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                ResponseJson(json!({ "error": turn_error_message(&e), "details": format!("{:?}", e) })),
            ))
        }
    }
}

fn turn_error_message(error: &AgentError) -> String {
    match error {
        AgentError::ContextLengthExceeded(details) => format!(
            "Model context length exceeded. The conversation history or tool descriptions are too long. \
             Please try a shorter query or start a new session. Internal Details: {}",
            details
        ),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::agent::test_support::{ScriptedLlm, registries};
    use crate::server::{AppState, router};
    use crate::services::ChatService;
    use crate::session::SessionStore;

    fn state(llm: ScriptedLlm) -> (AppState, Arc<ScriptedLlm>) {
        let llm = Arc::new(llm);
        let (trade, market) = registries("http://127.0.0.1:9", Some("WaLLet1111"), None);
        let sessions = Arc::new(SessionStore::default());
        let chat = ChatService::new(llm.clone(), sessions, trade, market, Some("WaLLet1111"));
        (AppState { chat: Arc::new(chat) }, llm)
    }

    async fn post(state: AppState, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_order_and_messages() {
        let cases = [
            (r#"{"message":"hi","mode":"SAK_AGENT_NLP"}"#, "SessionId is required"),
            (r#"{"sessionId":"","message":"hi","mode":"SAK_AGENT_NLP"}"#, "SessionId is required"),
            (r#"{"sessionId":"s1","mode":"SAK_AGENT_NLP"}"#, "Message is required for NLP modes"),
            (
                r#"{"sessionId":"s1","message":"hi"}"#,
                "Valid mode (SAK_AGENT_NLP or OKX_API_AGENT_NLP) is required",
            ),
            (
                r#"{"sessionId":"s1","message":"hi","mode":"DIRECT"}"#,
                "Valid mode (SAK_AGENT_NLP or OKX_API_AGENT_NLP) is required",
            ),
            (r#"{}"#, "SessionId is required"),
        ];

        for (body, expected) in cases {
            let (state, llm) = state(ScriptedLlm::new());
            let (status, json) = post(state, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
            assert_eq!(json["error"], expected);
            assert!(llm.requests().is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (state, _) = state(ScriptedLlm::new());
        let (status, json) = post(state, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_text_reply() {
        let (state, llm) = state(ScriptedLlm::new().then_text("Hello from the copilot"));
        let sessions = state.chat.sessions().clone();
        let (status, json) = post(
            state,
            r#"{"sessionId":"s1","message":"hi","mode":"OKX_API_AGENT_NLP"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["responses"].as_array().unwrap().len(), 1);
        assert_eq!(json["responses"][0]["role"], "assistant");
        assert_eq!(json["responses"][0]["content"], "Hello from the copilot");
        assert_eq!(llm.requests()[0].temperature, 0.0);
        assert_eq!(sessions.get("s1").len(), 2);
    }

    #[tokio::test]
    async fn test_context_length_error() {
        let llm = ScriptedLlm::new().then_error(AgentError::ContextLengthExceeded("too many tokens".into()));
        let (state, _) = state(llm);
        let sessions = state.chat.sessions().clone();
        let (status, json) = post(
            state,
            r#"{"sessionId":"s1","message":"hi","mode":"SAK_AGENT_NLP"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = json["error"].as_str().unwrap();
        assert!(message.starts_with("Model context length exceeded."));
        assert!(message.ends_with("Internal Details: too many tokens"));
        assert!(json["details"].is_string());
        assert!(sessions.get("s1").is_empty());
    }

    #[tokio::test]
    async fn test_other_model_errors() {
        let llm = ScriptedLlm::new().then_error(AgentError::Api {
            status: 401,
            body: "invalid api key".into(),
        });
        let (state, _) = state(llm);
        let (status, json) = post(
            state,
            r#"{"sessionId":"s1","message":"hi","mode":"SAK_AGENT_NLP"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("invalid api key"));
    }
}
