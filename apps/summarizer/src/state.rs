use std::sync::Arc;

use crate::config::Config;
use crate::extraction::OcrEngine;
use crate::llm_client::TextGenerator;
use crate::rate_limit::ClientRateLimiter;
use crate::summary::SummarySettings;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generation backend. `LlmClient` in production, scripted stubs in tests.
    pub generator: Arc<dyn TextGenerator>,
    pub ocr: OcrEngine,
    pub summary: SummarySettings,
    /// Per-IP quota for `POST /summarize`.
    pub rate_limiter: Arc<ClientRateLimiter>,
    pub config: Config,
}
