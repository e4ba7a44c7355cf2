//! # Services Module
//!
//! Chat turn orchestration and on-chain swap submission.

pub mod chat_service;
pub mod swap_engine;

pub use chat_service::ChatService;
pub use swap_engine::SolanaSwapService;
