//! # OKX Module
//!
//! Signed access to the OKX Web3 DEX REST API and the two command registries
//! (Trade and Market/Balance/History) built on top of it.

pub mod args;
pub mod auth;
pub mod client;
pub mod commands;
pub mod error;
pub mod registry;

pub use auth::{OkxAuth, OkxCredentials};
pub use client::OkxClient;
pub use error::{CommandError, OkxError};
pub use registry::{CommandInfo, CommandRegistry, RegistryKind, SwapSubmitter};
