use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::agent::types::{AgentError, ChatCompletionRequest, ChatCompletionResponse, ModelMessage, ToolSchema};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// A chat model that can request tool calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the conversation and return the model's next message. When
    /// `tools` is `None` the model must answer in text.
    async fn complete(
        &self,
        messages: &[ModelMessage],
        tools: Option<&[ToolSchema]>,
        temperature: f32,
    ) -> Result<ModelMessage, AgentError>;
}

/// OpenAI chat completions client.
pub struct AIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AIClient {
    /// Fails with [`AgentError::Configuration`] when the API key is blank.
    pub fn new(api_key: String, base_url: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        if api_key.trim().is_empty() {
            return Err(AgentError::Configuration("OpenAI API key is empty".to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call the OpenAI API
    async fn call_openai_api(&self, request: &ChatCompletionRequest<'_>) -> Result<ModelMessage, AgentError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            if is_context_length_error(&body) {
                warn!("OpenAI rejected request: context length exceeded");
                return Err(AgentError::ContextLengthExceeded(body));
            }
            return Err(AgentError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let choice = parsed.choices.into_iter().next().ok_or(AgentError::EmptyResponse)?;
        debug!(
            "OpenAI finish_reason={:?}, tool_calls={}",
            choice.finish_reason,
            choice.message.requested_tool_calls().len()
        );
        Ok(choice.message)
    }
}

#[async_trait]
impl LlmClient for AIClient {
    async fn complete(
        &self,
        messages: &[ModelMessage],
        tools: Option<&[ToolSchema]>,
        temperature: f32,
    ) -> Result<ModelMessage, AgentError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            tools: tools.filter(|t| !t.is_empty()),
            temperature,
        };
        self.call_openai_api(&request).await
    }
}

fn is_context_length_error(body: &str) -> bool {
    body.contains("context_length_exceeded")
}
