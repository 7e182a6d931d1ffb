use super::ExtractError;

/// Extracts text page by page from an in-memory PDF and concatenates the pages
/// in document order with no separator between them.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(pages.concat())
}
