//! Extraction: turns an uploaded document into plain text.
//!
//! The filename suffix selects exactly one `DocumentFormat`; each variant has a
//! single extractor. Adding a format means adding a variant, and the compiler
//! points at every `match` that needs a new arm.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod text;

pub use self::ocr::OcrEngine;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format '{0}'")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("text is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("image decoding failed: {0}")]
    Image(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Raw upload as received by the summarize handler. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_filename(&self.filename)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

/// Closed set of formats the dispatcher understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
    Image(ImageKind),
    /// Carries the lower-cased suffix that matched nothing.
    Unsupported(String),
}

impl DocumentFormat {
    /// Picks the format from the text after the last `.` of the filename,
    /// compared case-insensitively. A name without a dot is treated as its
    /// own suffix and is therefore unsupported.
    pub fn from_filename(filename: &str) -> Self {
        let suffix = filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match suffix.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "txt" => DocumentFormat::Text,
            "jpg" | "jpeg" => DocumentFormat::Image(ImageKind::Jpeg),
            "png" => DocumentFormat::Image(ImageKind::Png),
            _ => DocumentFormat::Unsupported(suffix),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Text => "txt",
            DocumentFormat::Image(ImageKind::Jpeg) => "jpeg",
            DocumentFormat::Image(ImageKind::Png) => "png",
            DocumentFormat::Unsupported(suffix) => suffix,
        }
    }
}

/// Runs the single extractor selected by the document's suffix.
pub async fn extract_text(
    document: &UploadedDocument,
    ocr: &OcrEngine,
) -> Result<String, ExtractError> {
    let format = document.format();
    let bytes = document.bytes.clone();

    let text = match &format {
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || pdf::extract(&bytes)).await??,
        DocumentFormat::Docx => {
            tokio::task::spawn_blocking(move || docx::extract(&bytes)).await??
        }
        DocumentFormat::Text => text::extract(&bytes)?,
        DocumentFormat::Image(kind) => ocr.recognize(bytes, *kind).await?,
        DocumentFormat::Unsupported(suffix) => {
            return Err(ExtractError::UnsupportedFormat(suffix.clone()));
        }
    };

    debug!(
        "Extracted {} chars from '{}' ({})",
        text.chars().count(),
        document.filename,
        format.label()
    );

    Ok(text)
}
