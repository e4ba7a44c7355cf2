//! Scripted model client for exercising the agent without OpenAI.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::agent::ai_client::LlmClient;
use crate::agent::types::{AgentError, FunctionCall, ModelMessage, ToolCall, ToolSchema};
use crate::okx::{CommandRegistry, OkxAuth, OkxClient, OkxCredentials, SwapSubmitter};

/// One request the scripted client received.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub messages: Vec<ModelMessage>,
    pub tool_names: Option<Vec<String>>,
    pub temperature: f32,
}

/// Replays queued replies in order and records every request.
///
/// When the script runs out it answers with a fixed text message.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<ModelMessage, AgentError>>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_text(self, text: &str) -> Self {
        self.replies.lock().push_back(Ok(ModelMessage::assistant(text)));
        self
    }

    /// Queue a single tool call with the given id.
    pub fn then_tool(self, id: &str, name: &str, arguments: Value) -> Self {
        let call = tool_call(id, name, arguments);
        self.replies.lock().push_back(Ok(ModelMessage::assistant_tool_calls(vec![call])));
        self
    }

    pub fn then_tools(self, calls: Vec<ToolCall>) -> Self {
        self.replies.lock().push_back(Ok(ModelMessage::assistant_tool_calls(calls)));
        self
    }

    pub fn then_error(self, error: AgentError) -> Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }
}

pub fn tool_call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(
        &self,
        messages: &[ModelMessage],
        tools: Option<&[ToolSchema]>,
        temperature: f32,
    ) -> Result<ModelMessage, AgentError> {
        self.seen.lock().push(SeenRequest {
            messages: messages.to_vec(),
            tool_names: tools.map(|t| t.iter().map(|s| s.function.name.clone()).collect()),
            temperature,
        });
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelMessage::assistant("[scripted reply exhausted]")))
    }
}

/// Trade and market registries pointed at `base_url` with empty credentials.
pub fn registries(
    base_url: &str,
    wallet: Option<&str>,
    submitter: Option<Arc<dyn SwapSubmitter>>,
) -> (Arc<CommandRegistry>, Arc<CommandRegistry>) {
    let client = || {
        OkxClient::new(OkxAuth::new(OkxCredentials::default()), base_url, Duration::from_secs(5))
            .expect("test client")
    };
    let wallet = wallet.map(str::to_string);
    let mut trade = CommandRegistry::trade(client(), wallet.clone());
    if let Some(submitter) = submitter {
        trade = trade.with_submitter(submitter);
    }
    let market = CommandRegistry::market(client(), wallet);
    (Arc::new(trade), Arc::new(market))
}
