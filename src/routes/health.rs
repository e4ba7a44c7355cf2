use axum::response::Json;
use serde_json::json;

/// Health check endpoint handler.
///
/// Answers without touching the model, the OKX API or the Solana RPC, so a
/// healthy reply only means the HTTP listener is serving.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
///
/// # Response Format
/// ```json
/// { "status": "pong" }
/// ```
///
/// # HTTP Status Codes
/// - **200 OK**: the server is accepting requests
///
/// # Examples
/// ```bash
/// curl http://localhost:3001/ping
/// # {"status":"pong"}
/// ```
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}
