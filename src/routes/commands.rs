use axum::{extract::State, response::Json as ResponseJson};
use serde::Serialize;

use crate::okx::CommandInfo;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct CommandListing {
    pub trade: Vec<CommandInfo>,
    pub market: Vec<CommandInfo>,
}

/// Command listing handler.
///
/// Describes every command of the trade and market registries, the same
/// set the agent exposes as tools.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/api/commands`
///
/// # Response Format
/// ```json
/// {
///   "trade": [
///     {
///       "name": "okx_get_quote",
///       "ui_description": "...",
///       "llm_tool_description": "...",
///       "example": "okx_get_quote chainIndex=501 ...",
///       "requiredParams": ["chainIndex", "amount", "fromTokenAddress", "toTokenAddress"]
///     }
///   ],
///   "market": [ ... ]
/// }
/// ```
///
/// # HTTP Status Codes
/// - **200 OK**: always
///
/// # Examples
/// ```bash
/// curl http://localhost:3001/api/commands
/// ```
pub async fn list_commands(State(state): State<AppState>) -> ResponseJson<CommandListing> {
    ResponseJson(CommandListing {
        trade: state.chat.trade_registry().commands(),
        market: state.chat.market_registry().commands(),
    })
}
