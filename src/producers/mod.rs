//! Producer contracts the orchestrator consumes.
//!
//! Three narrow interfaces separate the aggregation engine from its
//! I/O-bound collaborators: a [`TermSource`] turns a topic into a lazy
//! sequence of search terms, a [`SearchProvider`] turns a query into a lazy
//! sequence of candidate documents, and a [`Summarizer`] turns one document
//! into a summarized [`Paper`] or a typed failure.
//!
//! Failure severity differs per contract and the orchestrator depends on it:
//!
//! - A [`TermSource`] failure is FATAL: without terms there is no work.
//! - A [`SearchProvider`] failure degrades one branch: implementations log
//!   and end the stream early rather than surfacing an error.
//! - A [`Summarizer`] failure is local to one document and never aborts
//!   sibling documents or the run.

mod mock;
mod summarizer;
mod terms;
mod web_search;

pub use mock::{MockSearchProvider, MockSummarizer, MockTermSource};
pub use summarizer::PdfSummarizer;
pub use terms::OpenAiTermSource;
pub use web_search::GoogleSearchProvider;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use url::Url;

use crate::llm::LlmError;
use crate::models::Paper;

/// A reference to a candidate document discovered by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// Where the document can be fetched from
    pub url: Url,
}

impl DocumentRef {
    /// Parse a document reference from a URL string.
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(url)?,
        })
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Lazy sequence of search terms; an `Err` item aborts the run.
pub type TermStream = BoxStream<'static, Result<String, TermError>>;

/// Lazy sequence of candidate documents; ends early on provider failure.
pub type DocumentStream = BoxStream<'static, DocumentRef>;

/// Produces search terms for a topic.
#[async_trait]
pub trait TermSource: Send + Sync + std::fmt::Debug {
    /// Produce at most `limit` search terms for `topic`; may produce fewer.
    ///
    /// Both a failure to establish the stream and an `Err` item mid-stream
    /// are fatal to the research run.
    async fn generate_terms(&self, topic: &str, limit: usize) -> Result<TermStream, TermError>;
}

/// Produces candidate document references for a query.
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Produce at most `limit` document references for `query`.
    ///
    /// Implementations swallow their own failures by logging; the stream
    /// simply ends early and the branch keeps whatever it already has.
    fn top_documents(&self, query: &str, limit: usize) -> DocumentStream;
}

/// Summarizes a single document.
#[async_trait]
pub trait Summarizer: Send + Sync + std::fmt::Debug {
    /// Download, extract, and summarize one document.
    ///
    /// Single-shot, no retry. A failure here never affects other in-flight
    /// documents or the run as a whole.
    async fn summarize(&self, doc: &DocumentRef) -> Result<Paper, SummarizeError>;
}

/// Errors from a term source. All of these are fatal to the run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TermError {
    /// The LLM API rejected the request or returned an error
    #[error("LLM API error: {0}")]
    Api(String),

    /// Network or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// The term stream broke mid-flight
    #[error("term stream error: {0}")]
    Stream(String),
}

impl From<LlmError> for TermError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Network(msg) => TermError::Network(msg),
            LlmError::Api { status, message } => {
                TermError::Api(format!("status {status}: {message}"))
            }
            LlmError::MalformedResponse(msg) => TermError::Stream(msg),
        }
    }
}

/// Errors from summarizing one document. All of these are leaf-local.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    /// Download or LLM transport failure
    #[error("network error: {0}")]
    Network(String),

    /// The document text could not be extracted
    #[error("text extraction failed: {0}")]
    Extract(String),

    /// The LLM API rejected the summarization request
    #[error("LLM API error: {0}")]
    Api(String),

    /// The LLM response could not be parsed into a paper summary
    #[error("malformed summary response: {0}")]
    MalformedResponse(String),

    /// Filesystem error while buffering the download
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LlmError> for SummarizeError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Network(msg) => SummarizeError::Network(msg),
            LlmError::Api { status, message } => {
                SummarizeError::Api(format!("status {status}: {message}"))
            }
            LlmError::MalformedResponse(msg) => SummarizeError::MalformedResponse(msg),
        }
    }
}

impl From<reqwest::Error> for SummarizeError {
    fn from(err: reqwest::Error) -> Self {
        SummarizeError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ref_parse() {
        let doc = DocumentRef::parse("https://example.com/paper.pdf").unwrap();
        assert_eq!(doc.to_string(), "https://example.com/paper.pdf");

        assert!(DocumentRef::parse("not a url").is_err());
    }

    #[test]
    fn test_llm_error_maps_to_term_error() {
        let err = TermError::from(LlmError::Api {
            status: 429,
            message: "rate limited".to_string(),
        });
        assert!(matches!(err, TermError::Api(_)));
        assert!(err.to_string().contains("429"));
    }
}
