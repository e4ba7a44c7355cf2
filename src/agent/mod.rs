//! # Agent Module
//!
//! The tool-calling copilot: OpenAI client, tool adapter over the OKX
//! registries, per-mode prompts and the executor loop tying them together.

pub mod ai_client;
pub mod executor;
pub mod prompts;
pub mod tools;
pub mod types;

#[cfg(test)]
pub mod test_support;

pub use ai_client::{AIClient, LlmClient};
pub use executor::{AgentExecutor, AgentOutcome, AgentStep};
pub use tools::{AgentMode, ToolContext, ToolSet};
pub use types::AgentError;
