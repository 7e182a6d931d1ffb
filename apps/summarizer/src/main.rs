mod config;
mod errors;
mod extraction;
mod llm_client;
mod rate_limit;
mod render;
mod routes;
mod state;
mod summary;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::OcrEngine;
use crate::llm_client::LlmClient;
use crate::rate_limit::ClientRateLimiter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::summary::SummarySettings;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing OPENAI_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Summarizer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        config.llm_max_retries,
    )
    .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm.model());

    let ocr = OcrEngine::new(config.tesseract_path.clone());
    info!("OCR engine: {}", config.tesseract_path);

    // Per-IP quota for /summarize; idle clients are evicted hourly
    let rate_limiter = Arc::new(ClientRateLimiter::per_day(
        config.rate_limit_per_day,
        config.trust_forwarded_for,
    )?);
    rate_limiter.spawn_eviction();
    info!(
        "Rate limit: {} requests/day per client (trust X-Forwarded-For: {})",
        config.rate_limit_per_day, config.trust_forwarded_for
    );

    let summary = SummarySettings::from_config(&config);
    info!(
        "Summaries: up to {} attempts of {} tokens",
        summary.max_attempts, summary.max_tokens
    );

    // Build app state
    let state = AppState {
        generator: Arc::new(llm),
        ocr,
        summary,
        rate_limiter,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
