use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::ai_client::LlmClient;
use crate::agent::tools::{ToolContext, ToolSet};
use crate::agent::types::{AgentError, ModelMessage};
use crate::session::summary::truncate_chars;

/// Tool-call rounds allowed per turn. Tools are withheld on the last one.
pub const MAX_TOOL_ROUNDS: usize = 8;

const OBSERVATION_LOG_CHARS: usize = 300;

/// One tool invocation made while answering.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub tool_call_id: String,
    pub input: String,
    pub observation: String,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub steps: Vec<AgentStep>,
    pub output: String,
}

/// Drives the model through tool calls until it answers in text.
pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Answer `input` given prior `history`.
    ///
    /// Tool calls in one response run one after another, in the order the
    /// model listed them.
    pub async fn run(
        &self,
        system_prompt: &str,
        history: Vec<ModelMessage>,
        input: &str,
        tools: &ToolSet,
        temperature: f32,
        ctx: &ToolContext,
    ) -> Result<AgentOutcome, AgentError> {
        let schemas = tools.schemas();
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ModelMessage::system(system_prompt));
        messages.extend(history);
        messages.push(ModelMessage::user(input));

        let mut steps: Vec<AgentStep> = Vec::new();

        for round in 0..MAX_TOOL_ROUNDS {
            let offered = if round + 1 < MAX_TOOL_ROUNDS {
                Some(schemas.as_slice())
            } else {
                warn!("Tool loop reached {} rounds, forcing a text answer", MAX_TOOL_ROUNDS);
                None
            };
            debug!(round, messages = messages.len(), "calling model");

            let reply = self.llm.complete(&messages, offered, temperature).await?;
            if reply.requested_tool_calls().is_empty() || offered.is_none() {
                return Ok(AgentOutcome {
                    output: reply.content.unwrap_or_default(),
                    steps,
                });
            }

            let mut calls = reply.tool_calls.unwrap_or_default();
            for call in calls.iter_mut() {
                if call.id.is_empty() {
                    call.id = format!("tool_call_{}", Uuid::new_v4());
                }
            }
            info!(round, count = calls.len(), "Model requested tool calls");
            messages.push(ModelMessage::assistant_tool_calls(calls.clone()));

            for call in calls {
                let observation = tools.invoke(&call.function.name, &call.function.arguments, ctx).await;
                info!(
                    "Tool Call: {} Input: {} Observation (Sample): {}",
                    call.function.name,
                    call.function.arguments,
                    truncate_chars(&observation, OBSERVATION_LOG_CHARS)
                );
                messages.push(ModelMessage::tool(&call.id, &observation));
                steps.push(AgentStep {
                    tool: call.function.name,
                    tool_call_id: call.id,
                    input: call.function.arguments,
                    observation,
                });
            }
        }

        Ok(AgentOutcome {
            output: String::new(),
            steps,
        })
    }
}
