//! Utility modules supporting research operations.
//!
//! - [`HttpClient`]: shared HTTP client with per-producer user agent and
//!   timeout configuration
//! - [`extract_text`]: extract text content from PDF files
//! - [`PdfExtractError`]: errors that can occur during PDF extraction

mod http;
mod pdf;

pub use http::{HttpClient, HttpClientBuilder};
pub use pdf::{extract_text, PdfExtractError};
