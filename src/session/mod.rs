//! # Session Module
//!
//! Per-session chat history with summarized tool output, turn numbering and
//! the pending-quote record used to gate swap execution.

pub mod message;
pub mod store;
pub mod summary;

pub use message::{ChatMessage, Role};
pub use store::{PendingQuote, SessionStore, TurnStart};
pub use summary::summarize_tool_output;
