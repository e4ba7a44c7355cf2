// # Routes Module
//
// - HTTP route handlers for the copilot server, one submodule per API area.
// - Routes are registered in `server.rs`.

/// Health check endpoint
pub mod health;

/// Chat turns against the copilot agents
pub mod chat;

/// Direct listing of the OKX command registries
pub mod commands;
