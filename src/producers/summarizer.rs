//! Document summarization: download, extract text, summarize via LLM.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{DownloadConfig, LlmConfig};
use crate::llm::{parse_yaml_block, ChatClient, CompletionParams, PromptBuilder};
use crate::models::Paper;
use crate::producers::{DocumentRef, SummarizeError, Summarizer};
use crate::utils::{extract_text, HttpClient};

const SUMMARY_SYSTEM_PROMPT: &str = "You are an academic researcher. You are an expert in \
reading scientific papers and summarizing them, so that other researchers can quickly \
understand their chief claims, discoveries, and conclusions.";

/// The YAML shape the summarization prompt asks the model for.
#[derive(Debug, Deserialize)]
struct PaperSummary {
    title: String,
    summary: String,
    #[serde(default)]
    authors: Option<Vec<String>>,
    #[serde(default)]
    publisher: Option<String>,
}

impl PaperSummary {
    fn into_paper(self, url: &str) -> Paper {
        Paper {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            url: url.to_string(),
            authors: self.authors,
            publisher: self.publisher.map(|p| p.trim().to_string()),
        }
    }
}

/// Summarizes one document end to end: fetch the bytes, extract the text
/// (PDF first, HTML as fallback), and ask the LLM for a structured summary.
#[derive(Debug, Clone)]
pub struct PdfSummarizer {
    http: HttpClient,
    llm: Arc<ChatClient>,
    context_chars: usize,
    max_bytes: usize,
}

impl PdfSummarizer {
    /// Create a summarizer from the LLM and download configuration sections.
    pub fn new(llm: Arc<ChatClient>, llm_config: &LlmConfig, downloads: &DownloadConfig) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(Duration::from_secs(downloads.timeout_seconds))
                .build(),
            llm,
            context_chars: llm_config.paper_context_chars,
            max_bytes: downloads.max_file_size_mb * 1024 * 1024,
        }
    }

    async fn extract_document_text(&self, doc: &DocumentRef) -> Result<String, SummarizeError> {
        let response = self
            .http
            .client()
            .get(doc.url.clone())
            .send()
            .await?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let bytes = response.bytes().await?;
        if bytes.len() > self.max_bytes {
            return Err(SummarizeError::Extract(format!(
                "document too large: {} bytes",
                bytes.len()
            )));
        }

        if looks_like_pdf(&content_type, doc, &bytes) {
            // The PDF backends want a file on disk; buffer the download in a
            // tempfile and parse it off the async runtime.
            let mut file = tempfile::NamedTempFile::new()?;
            file.write_all(&bytes)?;
            let path = file.path().to_path_buf();
            let text = tokio::task::spawn_blocking(move || extract_text(&path))
                .await
                .map_err(|e| SummarizeError::Extract(e.to_string()))?
                .map_err(|e| SummarizeError::Extract(e.to_string()))?;
            drop(file);
            Ok(text)
        } else {
            Ok(html_to_text(&String::from_utf8_lossy(&bytes)))
        }
    }

    fn summary_request(&self, text: &str) -> String {
        format!(
            "Paper text:\n{text}\n\n\
             Instructions:\n\
             * Read the text carefully. It may be truncated or missing sections, but it's \
             important to understand the main points.\n\
             * Focus on the context (specific field of research, problem addressed), \
             methodology (how the research was conducted), and conclusions (the main \
             findings and their implications).\n\n\
             Response format:\n\
             Write a single YAML object with the fields below. Do NOT use any markdown or \
             additional text in the output other than the YAML object (do not start with \
             ```yaml, just write the pure yaml). Use block style for all strings to avoid \
             escaping characters.\n\n\
             Fields:\n\
             title: the title of the paper (string, required)\n\
             summary: a brief summary of the paper (string, required)\n\
             authors: the authors of the paper (list of strings, omit if unknown)\n\
             publisher: the journal or other venue where the paper was published (string, \
             omit if unknown)\n\n\
             Example response:\n\
             title: |\n\
            \x20 The title of the paper\n\
             summary: |\n\
            \x20 A summary of the paper with the context, methodology, and conclusions.\n\
             authors:\n\
            \x20 - Author 1\n\
            \x20 - Author 2\n\
             publisher: |\n\
            \x20 Cornell University Press\n\n\
             Your response:"
        )
    }
}

#[async_trait]
impl Summarizer for PdfSummarizer {
    async fn summarize(&self, doc: &DocumentRef) -> Result<Paper, SummarizeError> {
        debug!(url = %doc.url, "reading document");
        let text = self.extract_document_text(doc).await?;
        if text.trim().is_empty() {
            return Err(SummarizeError::Extract(
                "document contained no extractable text".to_string(),
            ));
        }

        let excerpt = truncate_chars(&text, self.context_chars);
        let messages = PromptBuilder::system(SUMMARY_SYSTEM_PROMPT)
            .user(self.summary_request(excerpt))
            .build();
        let response = self
            .llm
            .complete(&messages, CompletionParams::default())
            .await?;

        let summary: PaperSummary = parse_yaml_block(&response)
            .map_err(|e| SummarizeError::MalformedResponse(e.to_string()))?;
        Ok(summary.into_paper(doc.url.as_str()))
    }
}

fn looks_like_pdf(content_type: &str, doc: &DocumentRef, bytes: &[u8]) -> bool {
    content_type.contains("pdf")
        || doc.url.path().to_ascii_lowercase().ends_with(".pdf")
        || bytes.starts_with(b"%PDF")
}

/// Pull readable text out of an HTML page, preferring content blocks over
/// raw markup soup.
fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let blocks = Selector::parse("p, h1, h2, h3, li").expect("valid selector");

    let mut out = String::new();
    for node in document.select(&blocks) {
        let text: String = node.text().collect();
        let text = text.trim();
        if !text.is_empty() {
            out.push_str(text);
            out.push('\n');
        }
    }
    if out.is_empty() {
        out = document
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ");
    }
    out
}

/// Truncate on a character boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
