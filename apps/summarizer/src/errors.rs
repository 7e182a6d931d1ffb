use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::llm_client::LlmError;
use crate::render;

/// Body returned verbatim when the upload's suffix has no extractor.
pub const UNSUPPORTED_FORMAT_BODY: &str = "Unsupported file format";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(#[from] MultipartError),

    #[error("Extraction error: {0}")]
    Extraction(ExtractError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(ext) => AppError::UnsupportedFormat(ext),
            other => AppError::Extraction(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::UnsupportedFormat(ext) => {
                tracing::info!("Rejected upload with unsupported suffix '{ext}'");
                return (StatusCode::BAD_REQUEST, UNSUPPORTED_FORMAT_BODY).into_response();
            }
            AppError::RateLimited => {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Html(render::too_many_requests_page()),
                )
                    .into_response();
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upload(e) => {
                tracing::warn!("Upload error: {e}");
                (e.status(), e.body_text())
            }
            AppError::Extraction(e) => {
                tracing::warn!("Extraction error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "The document could not be read. Please check the file and try again."
                        .to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "The summarization service is unavailable right now.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        (status, Html(render::error_page(status, &message))).into_response()
    }
}
