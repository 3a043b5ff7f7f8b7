//! PDF text extraction utilities.
//!
//! Extraction goes through pdf-extract first and falls back to lopdf when
//! pdf-extract cannot handle the file. Both are pure-Rust, so extraction is
//! always available; some scanned or image-based PDFs still yield empty
//! text.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("file not found or not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract text from a PDF file.
///
/// Returns the extracted text content, or an error if both extraction
/// backends fail.
pub fn extract_text(path: &Path) -> Result<String, PdfExtractError> {
    if !path.is_file() {
        return Err(PdfExtractError::InvalidFile(format!(
            "not a file: {}",
            path.display()
        )));
    }

    match pdf_extract::extract_text(path) {
        Ok(text) => {
            if text.trim().is_empty() {
                // Likely a scanned or image-based PDF.
                debug!("extracted empty text from PDF: {}", path.display());
            }
            Ok(text)
        }
        Err(primary) => extract_text_lopdf(path).map_err(|fallback| {
            PdfExtractError::ExtractionFailed(format!(
                "pdf-extract: {primary}; lopdf: {fallback}"
            ))
        }),
    }
}

/// Fallback extraction via lopdf's page-level text extraction.
fn extract_text_lopdf(path: &Path) -> Result<String, String> {
    let document = lopdf::Document::load(path).map_err(|e| e.to_string())?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    document.extract_text(&pages).map_err(|e| e.to_string())
}
