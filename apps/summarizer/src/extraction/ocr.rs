//! Image OCR through the Tesseract command-line engine.

use std::io::Cursor;
use std::process::Stdio;

use bytes::Bytes;
use image::ImageFormat;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{ExtractError, ImageKind};

/// Handle to the OCR engine. Built once at startup from `TESSERACT_PATH`.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    tesseract_path: String,
}

impl OcrEngine {
    pub fn new(tesseract_path: impl Into<String>) -> Self {
        Self {
            tesseract_path: tesseract_path.into(),
        }
    }

    /// Decodes the image, normalizes it to PNG and returns the text Tesseract reads from it.
    pub async fn recognize(&self, bytes: Bytes, kind: ImageKind) -> Result<String, ExtractError> {
        let png = tokio::task::spawn_blocking(move || normalize_to_png(&bytes, kind)).await??;
        self.run_tesseract(png).await
    }

    async fn run_tesseract(&self, png: Vec<u8>) -> Result<String, ExtractError> {
        let mut child = Command::new(&self.tesseract_path)
            .args(["stdin", "stdout"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ExtractError::Ocr(format!("failed to start '{}': {e}", self.tesseract_path))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExtractError::Ocr("tesseract stdin unavailable".to_string()))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&png).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExtractError::Ocr(format!("tesseract did not finish: {e}")))?;
        let written = writer.await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        written.map_err(|e| ExtractError::Ocr(format!("failed to send image to tesseract: {e}")))?;

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Tesseract recognized {} bytes of text", text.len());
        Ok(text)
    }
}

fn normalize_to_png(bytes: &[u8], kind: ImageKind) -> Result<Vec<u8>, ExtractError> {
    let format = match kind {
        ImageKind::Jpeg => ImageFormat::Jpeg,
        ImageKind::Png => ImageFormat::Png,
    };
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ExtractError::Image(e.to_string()))?;

    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ExtractError::Image(e.to_string()))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn tiny_image(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_png_is_normalized() {
        let png = normalize_to_png(&tiny_image(ImageFormat::Png), ImageKind::Png).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_jpeg_is_reencoded_as_png() {
        let png = normalize_to_png(&tiny_image(ImageFormat::Jpeg), ImageKind::Jpeg).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = normalize_to_png(b"definitely not an image", ImageKind::Png).unwrap_err();
        assert!(matches!(err, ExtractError::Image(_)));
    }

    #[tokio::test]
    async fn test_missing_engine_binary_is_an_ocr_error() {
        let engine = OcrEngine::new("/nonexistent/tesseract-binary");
        let err = engine
            .recognize(Bytes::from(tiny_image(ImageFormat::Png)), ImageKind::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Ocr(msg) if msg.contains("failed to start")));
    }
}
