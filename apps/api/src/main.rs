mod access;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod summarize;

use anyhow::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::access::rate_limit::RateLimiter;
use crate::config::Config;
use crate::llm_client::{Completer, OpenAiClient};
use crate::routes::build_router;
use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Summarizer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize provider client. A failure here is not fatal: the service
    // still answers health checks and reports 500 on summarization.
    let completer: Option<Arc<dyn Completer>> = match OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        Duration::from_secs(config.provider_timeout_secs),
    ) {
        Ok(client) => {
            info!(
                "LLM client initialized (model: {}, custom endpoint: {})",
                config.openai_model,
                config.openai_base_url.is_some()
            );
            Some(Arc::new(client) as Arc<dyn Completer>)
        }
        Err(e) => {
            error!("Failed to build LLM client: {e}");
            None
        }
    };

    if config.service_api_key.is_none() {
        error!("API_KEY is not set; every summarization request will be rejected");
    }
    info!("CORS allowlist: {:?}", config.cors_origins);

    let limiter = RateLimiter::new();
    let _sweeper = limiter.spawn_sweeper(SWEEP_INTERVAL);

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        completer,
        limiter,
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. If the handler cannot be installed the
/// server keeps running until the process is killed.
async fn wait_for_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        error!("Failed to install ctrl-c handler: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
