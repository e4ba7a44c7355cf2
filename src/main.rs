//! # OKX DEX Copilot
//!
//! Chat backend that turns natural-language requests into signed calls
//! against the OKX Web3 DEX API, built with Axum and Tokio.
//!
//! ## Architecture
//! - `okx`: request signing, argument parsing and the command registries
//! - `agent`: OpenAI client, tool adapter, prompts and the tool-calling loop
//! - `session`: per-session chat history with tool output summaries
//! - `services`: chat turn orchestration and Solana swap signing
//! - `routes`: HTTP handlers (`/api/chat`, `/api/commands`, `/ping`)
//! - `server` / `config`: wiring and environment configuration
//!
//! ## Running the Server
//! ```bash
//! # SOLANA_PRIVATE_KEY, RPC_URL and OPENAI_API_KEY via the environment or .env
//! cargo run
//! ```

mod agent;
mod config;
mod okx;
mod routes;
mod server;
mod services;
mod session;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::info!("🏁 Starting OKX DEX copilot...");
    tracing::info!("📦 Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::start(config).await {
        tracing::error!("Server stopped: {:#}", e);
        std::process::exit(1);
    }
}
