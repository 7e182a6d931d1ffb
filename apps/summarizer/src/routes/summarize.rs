//! Axum route handlers for the upload form and the summarize endpoint.

use axum::{
    extract::{Multipart, State},
    response::Html,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_text, UploadedDocument};
use crate::render;
use crate::state::AppState;
use crate::summary::summarize;

const FILE_FIELD: &str = "file";
const TEXT_FIELD: &str = "text";
const PASTED_SOURCE: &str = "pasted text";

/// GET /
pub async fn handle_index() -> Html<String> {
    Html(render::index_page())
}

/// POST /summarize
///
/// Accepts a multipart `file` (dispatched by suffix) or, failing that, a
/// `text` field with the resume pasted in. Renders the summary page.
pub async fn handle_summarize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let request_id = Uuid::new_v4();
    async move {
        let input = read_input(multipart).await?;

        let (source, resume_text) = match input {
            SummarizeInput::Document(document) => {
                let format = document.format();
                info!(
                    filename = %document.filename,
                    format = format.label(),
                    bytes = document.bytes.len(),
                    "Extracting uploaded document"
                );
                let text = extract_text(&document, &state.ocr).await?;
                (document.filename, text)
            }
            SummarizeInput::Pasted(text) => {
                info!(chars = text.chars().count(), "Summarizing pasted text");
                (PASTED_SOURCE.to_string(), text)
            }
        };

        let summary = summarize(state.generator.as_ref(), &resume_text, &state.summary).await?;
        info!(
            attempts = summary.attempts,
            complete = summary.complete,
            "Summary generated"
        );

        Ok(Html(render::summary_page(&summary, &source)))
    }
    .instrument(info_span!("summarize", %request_id))
    .await
}

enum SummarizeInput {
    Document(UploadedDocument),
    Pasted(String),
}

/// Reads the form. A non-empty file wins over pasted text; browsers send an
/// empty, unnamed file part when nothing was chosen.
async fn read_input(mut multipart: Multipart) -> Result<SummarizeInput, AppError> {
    let mut document = None;
    let mut pasted = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !filename.is_empty() || !bytes.is_empty() {
                    document = Some(UploadedDocument::new(filename, bytes));
                }
            }
            Some(TEXT_FIELD) => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    pasted = Some(text);
                }
            }
            _ => {}
        }
    }

    match (document, pasted) {
        (Some(document), _) => Ok(SummarizeInput::Document(document)),
        (None, Some(text)) => Ok(SummarizeInput::Pasted(text)),
        (None, None) => Err(AppError::Validation(
            "Please choose a resume file or paste the resume text.".to_string(),
        )),
    }
}
