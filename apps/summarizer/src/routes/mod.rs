pub mod health;
pub mod summarize;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::rate_limit::enforce_quota;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Only the summarize route spends quota.
    let limited = Router::new()
        .route("/summarize", post(summarize::handle_summarize))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            enforce_quota,
        ));

    Router::new()
        .route("/", get(summarize::handle_index))
        .route("/health", get(health::health_handler))
        .merge(limited)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}
