use super::ExtractError;

/// Plain-text uploads are decoded strictly as UTF-8 and returned untouched.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    Ok(String::from_utf8(bytes.to_vec())?)
}
