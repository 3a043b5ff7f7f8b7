//! LLM-backed search term generation.

use async_trait::async_trait;
use futures_util::future::ready;
use futures_util::StreamExt;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::llm::{split_lines, ChatClient, CompletionParams, PromptBuilder};
use crate::producers::{TermError, TermSource, TermStream};

/// Generates search terms by streaming a chat completion and parsing it
/// line by line, so downstream search work starts as soon as the first
/// term leaves the model.
#[derive(Debug, Clone)]
pub struct OpenAiTermSource {
    client: Arc<ChatClient>,
    params: CompletionParams,
    pdf_only: bool,
}

impl OpenAiTermSource {
    /// Create a term source over a chat client.
    ///
    /// By default every generated term gets a `filetype:pdf` qualifier so
    /// the web search favors documents the summarizer can actually read.
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self {
            client,
            params: CompletionParams {
                max_tokens: 100,
                temperature: 0.8,
                top_p: 0.9,
            },
            pdf_only: true,
        }
    }

    /// Enable or disable the `filetype:pdf` qualifier.
    pub fn with_pdf_filter(mut self, pdf_only: bool) -> Self {
        self.pdf_only = pdf_only;
        self
    }

    fn system_prompt(limit: usize) -> String {
        format!(
            "You are an academic researcher. You are an expert in generating web search terms \
             for scientific papers. Whenever a user provides you with a topic, simply generate \
             search terms.\n\
             \n\
             Instructions:\n\
             * Write one search term per line\n\
             * You must not include any special characters in the search terms\n\
             * You must not include anything other than search terms in your response\n\
             * You must generate exactly {limit} search terms\n\
             * Vary the search terms to cover a wide range of topics related to the user's input"
        )
    }
}

#[async_trait]
impl TermSource for OpenAiTermSource {
    async fn generate_terms(&self, topic: &str, limit: usize) -> Result<TermStream, TermError> {
        debug!(topic, limit, "generating search terms");
        let messages = PromptBuilder::system(Self::system_prompt(limit))
            .user(format!("User topic: {topic}"))
            .build();

        let chunks = self
            .client
            .stream(&messages, self.params)
            .await
            .map_err(TermError::from)?;

        let pdf_only = self.pdf_only;
        let terms = split_lines(chunks)
            .map(move |line| match line {
                Ok(term) => {
                    let term = sanitize_term(&term);
                    Ok(if pdf_only && !term.is_empty() {
                        format!("{term} filetype:pdf")
                    } else {
                        term
                    })
                }
                Err(err) => Err(TermError::from(err)),
            })
            .filter(|item| ready(!matches!(item, Ok(term) if term.is_empty())))
            .take(limit);

        Ok(terms.boxed())
    }
}

/// Strip list numbering and special characters the model sneaks in despite
/// instructions, and collapse runs of whitespace.
fn sanitize_term(term: &str) -> String {
    static NUMBERING: OnceLock<Regex> = OnceLock::new();
    static SPECIALS: OnceLock<Regex> = OnceLock::new();
    let numbering = NUMBERING.get_or_init(|| Regex::new(r"^\s*\d+[.)]\s*").expect("valid regex"));
    let specials = SPECIALS.get_or_init(|| Regex::new(r#"[^\w\s-]"#).expect("valid regex"));

    let term = numbering.replace(term, "");
    let term = specials.replace_all(&term, "");
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}
