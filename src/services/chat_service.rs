//! Chat turn orchestration.
//!
//! A turn loads the session history, runs the agent for the selected mode,
//! shapes its steps into front-end messages and commits the whole turn to
//! history in one step. Failed turns leave history untouched.

use std::sync::Arc;

use tracing::{error, info};

use crate::agent::executor::{AgentExecutor, AgentOutcome};
use crate::agent::prompts::system_prompt;
use crate::agent::tools::{AgentMode, ToolContext, ToolSet};
use crate::agent::types::{AgentError, FunctionCall, ModelMessage, ToolCall};
use crate::agent::LlmClient;
use crate::okx::CommandRegistry;
use crate::session::{ChatMessage, Role, SessionStore, TurnStart};

struct ModeAgent {
    tools: ToolSet,
    prompt: String,
}

impl ModeAgent {
    fn new(mode: AgentMode, trade: &Arc<CommandRegistry>, market: &Arc<CommandRegistry>, wallet: Option<&str>) -> Self {
        let tools = ToolSet::for_mode(mode, trade, market);
        let prompt = system_prompt(mode, wallet, &tools);
        Self { tools, prompt }
    }
}

pub struct ChatService {
    executor: AgentExecutor,
    sessions: Arc<SessionStore>,
    trade: Arc<CommandRegistry>,
    market: Arc<CommandRegistry>,
    swap_agent: ModeAgent,
    api_agent: ModeAgent,
}

impl ChatService {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        sessions: Arc<SessionStore>,
        trade: Arc<CommandRegistry>,
        market: Arc<CommandRegistry>,
        wallet_address: Option<&str>,
    ) -> Self {
        let swap_agent = ModeAgent::new(AgentMode::SakAgentNlp, &trade, &market, wallet_address);
        let api_agent = ModeAgent::new(AgentMode::OkxApiAgentNlp, &trade, &market, wallet_address);
        info!(
            "Chat service ready: {} swap copilot tools, {} API copilot tools",
            swap_agent.tools.names().len(),
            api_agent.tools.names().len()
        );

        Self {
            executor: AgentExecutor::new(llm),
            sessions,
            trade,
            market,
            swap_agent,
            api_agent,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn trade_registry(&self) -> &CommandRegistry {
        &self.trade
    }

    pub fn market_registry(&self) -> &CommandRegistry {
        &self.market
    }

    /// Run one user turn and return the messages to show for it.
    ///
    /// Tool messages in the result carry full payloads; history only keeps
    /// their summaries.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        message: &str,
        mode: AgentMode,
    ) -> Result<Vec<ChatMessage>, AgentError> {
        info!("New user turn in session {} ({})", session_id, mode.as_str());

        let TurnStart { history, turn } = self.sessions.begin_turn(session_id);
        let agent = match mode {
            AgentMode::SakAgentNlp => &self.swap_agent,
            AgentMode::OkxApiAgentNlp => &self.api_agent,
        };
        let ctx = ToolContext::new(session_id, turn, Arc::clone(&self.sessions));

        let outcome = self
            .executor
            .run(
                &agent.prompt,
                history_to_model_messages(&history),
                message,
                &agent.tools,
                mode.temperature(),
                &ctx,
            )
            .await
            .map_err(|e| {
                error!("Turn {} in session {} failed: {}", turn, session_id, e);
                e
            })?;

        let responses = shape_responses(outcome);

        let mut staged = Vec::with_capacity(responses.len() + 1);
        staged.push(ChatMessage::user(message));
        staged.extend(responses.iter().cloned());
        self.sessions.commit_turn(session_id, &staged, ctx.take_staged_quote());

        info!("Turn {} in session {} answered with {} messages", turn, session_id, responses.len());
        Ok(responses)
    }
}

/// Replay stored history to the model.
///
/// A tool message is preceded by a synthetic assistant tool call with the
/// same id so the pair is well formed. Tool messages missing their name or
/// id are replayed as user text.
pub fn history_to_model_messages(history: &[ChatMessage]) -> Vec<ModelMessage> {
    let mut messages = Vec::with_capacity(history.len());
    for msg in history {
        match (msg.role, &msg.name, &msg.tool_call_id) {
            (Role::User, _, _) => messages.push(ModelMessage::user(&msg.content)),
            (Role::Assistant, _, _) => messages.push(ModelMessage::assistant(&msg.content)),
            (Role::Tool, Some(name), Some(id)) => {
                messages.push(ModelMessage::assistant_tool_calls(vec![ToolCall {
                    id: id.clone(),
                    call_type: "function".to_string(),
                    function: FunctionCall {
                        name: name.clone(),
                        arguments: "{}".to_string(),
                    },
                }]));
                messages.push(ModelMessage::tool(id, &msg.content));
            }
            (Role::Tool, _, _) => messages.push(ModelMessage::user(&msg.content)),
        }
    }
    messages
}

/// Front-end messages for a finished agent run.
pub fn shape_responses(outcome: AgentOutcome) -> Vec<ChatMessage> {
    let mut responses = Vec::with_capacity(outcome.steps.len() * 2 + 1);
    for step in outcome.steps {
        responses.push(ChatMessage::assistant(format!(
            "Okay, I will use the {} tool. Input: {}.",
            step.tool, step.input
        )));
        responses.push(ChatMessage::tool(step.tool, step.tool_call_id, step.observation));
    }
    responses.push(ChatMessage::assistant(outcome.output));
    responses
}
