//! Mock producers for testing purposes.
//!
//! All three mocks are scripted up front and safe to share across tasks.
//! Delays make completion order controllable, which is what the ordering
//! tests lean on.

use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::models::Paper;
use crate::producers::{
    DocumentRef, DocumentStream, SearchProvider, SummarizeError, Summarizer, TermError,
    TermSource, TermStream,
};

/// A term source that replays a scripted sequence.
#[derive(Debug, Default)]
pub struct MockTermSource {
    script: Mutex<Vec<Result<String, TermError>>>,
    fail_on_start: Mutex<Option<TermError>>,
    delay: Mutex<Duration>,
}

impl MockTermSource {
    /// Create an empty mock; it yields no terms until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term to the script.
    pub fn push_term(&self, term: &str) {
        self.script.lock().unwrap().push(Ok(term.to_string()));
    }

    /// Append a mid-stream failure to the script.
    pub fn push_failure(&self, err: TermError) {
        self.script.lock().unwrap().push(Err(err));
    }

    /// Make `generate_terms` itself fail, before any term is produced.
    pub fn fail_on_start(&self, err: TermError) {
        *self.fail_on_start.lock().unwrap() = Some(err);
    }

    /// Sleep this long before each scripted item.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl TermSource for MockTermSource {
    async fn generate_terms(&self, _topic: &str, limit: usize) -> Result<TermStream, TermError> {
        if let Some(err) = self.fail_on_start.lock().unwrap().clone() {
            return Err(err);
        }
        let items: Vec<_> = self
            .script
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect();
        let delay = *self.delay.lock().unwrap();

        Ok(stream! {
            for item in items {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield item;
            }
        }
        .boxed())
    }
}

/// A search provider that returns scripted references per query.
#[derive(Debug, Default)]
pub struct MockSearchProvider {
    results: Mutex<HashMap<String, Vec<DocumentRef>>>,
}

impl MockSearchProvider {
    /// Create an empty mock; unknown queries yield no documents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the references returned for a query.
    pub fn set_results(&self, query: &str, urls: &[&str]) {
        let refs = urls
            .iter()
            .map(|url| DocumentRef::parse(url).expect("valid mock url"))
            .collect();
        self.results.lock().unwrap().insert(query.to_string(), refs);
    }
}

impl SearchProvider for MockSearchProvider {
    fn top_documents(&self, query: &str, limit: usize) -> DocumentStream {
        let refs = self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        futures_util::stream::iter(refs.into_iter().take(limit)).boxed()
    }
}

#[derive(Debug, Clone)]
struct ScriptedSummary {
    result: Result<Paper, String>,
    delay: Duration,
}

/// A summarizer with a scripted outcome and delay per URL.
#[derive(Debug, Default)]
pub struct MockSummarizer {
    outcomes: Mutex<HashMap<String, ScriptedSummary>>,
}

impl MockSummarizer {
    /// Create an empty mock; unscripted URLs fail summarization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful summary for a URL.
    pub fn succeed(&self, url: &str, paper: Paper) {
        self.succeed_after(url, paper, Duration::ZERO);
    }

    /// Script a successful summary that takes `delay` to produce.
    pub fn succeed_after(&self, url: &str, paper: Paper, delay: Duration) {
        self.outcomes.lock().unwrap().insert(
            url.to_string(),
            ScriptedSummary {
                result: Ok(paper),
                delay,
            },
        );
    }

    /// Script a failure for a URL.
    pub fn fail(&self, url: &str) {
        self.fail_after(url, Duration::ZERO);
    }

    /// Script a failure that takes `delay` to surface.
    pub fn fail_after(&self, url: &str, delay: Duration) {
        self.outcomes.lock().unwrap().insert(
            url.to_string(),
            ScriptedSummary {
                result: Err("scripted failure".to_string()),
                delay,
            },
        );
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, doc: &DocumentRef) -> Result<Paper, SummarizeError> {
        let scripted = self.outcomes.lock().unwrap().get(doc.url.as_str()).cloned();
        let Some(scripted) = scripted else {
            return Err(SummarizeError::Extract(format!(
                "no scripted outcome for {}",
                doc.url
            )));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        match scripted.result {
            Ok(paper) => Ok(paper),
            Err(message) => Err(SummarizeError::Network(message)),
        }
    }
}
