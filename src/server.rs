//! # Server Module
//!
//! HTTP server setup and route configuration for the copilot server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::agent::AIClient;
use crate::config::Config;
use crate::okx::{CommandRegistry, OkxAuth, OkxClient};
use crate::routes::{chat, commands, health::ping};
use crate::services::{ChatService, SolanaSwapService};
use crate::session::SessionStore;

/// Application state shared across all route handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

/// Build the application router: `/ping`, `/api/chat` and `/api/commands`
/// behind a permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/api/chat", post(chat::chat))
        .route("/api/commands", get(commands::list_commands))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire the OKX registries, swap signer, model client and session store
/// together and serve until the process stops.
pub async fn start(config: Config) -> Result<()> {
    let okx_client = || {
        OkxClient::new(
            OkxAuth::new(config.okx.credentials.clone()),
            config.okx.base_url.clone(),
            config.http_timeout,
        )
        .context("Failed to build OKX HTTP client")
    };

    let swap_service = SolanaSwapService::new(&config.solana.private_key, &config.solana.rpc_url)
        .context("Failed to load SOLANA_PRIVATE_KEY")?;
    let wallet_address = config
        .solana
        .wallet_address
        .clone()
        .unwrap_or_else(|| swap_service.pubkey().to_string());

    let trade_client = okx_client()?;
    let okx_base_url = trade_client.base_url().to_string();
    let trade = CommandRegistry::trade(trade_client, Some(wallet_address.clone()))
        .with_submitter(Arc::new(swap_service));
    let market = CommandRegistry::market(okx_client()?, Some(wallet_address.clone()));

    let llm = AIClient::new(config.openai.api_key.clone(), config.openai.base_url.clone(), config.http_timeout)
        .context("Failed to build OpenAI HTTP client")?
        .with_model(config.openai.model.clone());
    let model = llm.model().to_string();

    let sessions = Arc::new(SessionStore::new(config.sessions.ttl, config.sessions.max_sessions));
    let sweep_every = config
        .sessions
        .ttl
        .min(Duration::from_secs(600))
        .max(Duration::from_secs(1));
    tokio::spawn(Arc::clone(&sessions).run_sweeper(sweep_every));

    let chat = ChatService::new(
        Arc::new(llm),
        sessions,
        Arc::new(trade),
        Arc::new(market),
        Some(&wallet_address),
    );
    let app = router(AppState { chat: Arc::new(chat) });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} - port may already be in use", addr))?;

    tracing::info!("🚀 Copilot server starting...");
    tracing::info!("📡 Listening on http://{}", addr);
    tracing::info!("👛 Wallet: {}", wallet_address);
    tracing::info!("🤖 Model: {} at {}", model, config.openai.base_url);
    tracing::info!("🔗 OKX DEX API: {}", okx_base_url);
    tracing::info!("🏥 Health check available at http://{}/ping", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
