//! Research orchestration.
//!
//! The [`Researcher`] wires the three producer contracts into two nested
//! applications of [`merge_expand`]: terms fan out into per-term search
//! streams, and each discovered document fans out into its own
//! summarization task. Every branch creation and leaf resolution is
//! observed exactly once as an internal event; the orchestrator's single
//! consumer turns each event into a fresh snapshot of the shared
//! [`ResearchTree`], which makes the emitted snapshot sequence monotonic by
//! construction.

mod merge;
mod sequencer;
mod tree;

pub use merge::{merge_expand, MergedStream};
pub use sequencer::sequence_snapshots;
pub use tree::{BranchId, ResearchTree};

use async_stream::stream;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::Research;
use crate::producers::{DocumentRef, SearchProvider, Summarizer, TermError, TermSource};

/// Fatal, run-level errors.
///
/// Everything below term generation degrades locally instead: a failed
/// search ends its branch early, a failed summarization drops one document.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// The term source failed; without terms there is no work to do.
    #[error("search term generation failed: {0}")]
    TermGeneration(#[from] TermError),
}

/// Tuning knobs the orchestrator passes through to the producers.
#[derive(Debug, Clone)]
pub struct ResearchOptions {
    /// How many search terms to request per run
    pub terms_per_research: usize,

    /// How many document references to request per term
    pub results_per_term: usize,

    /// Emit a snapshot when a document starts processing, even though no
    /// tree state changed. Off by default; consumers that want a liveness
    /// heartbeat per document can switch it back on.
    pub emit_heartbeats: bool,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            terms_per_research: 3,
            results_per_term: 10,
            emit_heartbeats: false,
        }
    }
}

/// One observed unit of progress inside a run, routed through the merge
/// layers to the single snapshot-emitting consumer.
#[derive(Debug)]
enum ResearchEvent {
    BranchAdded,
    DocumentStarted,
    LeafAdded,
    TermsFailed(TermError),
}

/// Drives one research run per call: topic in, snapshot stream out.
#[derive(Debug, Clone)]
pub struct Researcher {
    terms: Arc<dyn TermSource>,
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    options: ResearchOptions,
}

impl Researcher {
    /// Create a researcher over the three producers with default options.
    pub fn new(
        terms: Arc<dyn TermSource>,
        search: Arc<dyn SearchProvider>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            terms,
            search,
            summarizer,
            options: ResearchOptions::default(),
        }
    }

    /// Replace the tuning knobs.
    pub fn with_options(mut self, options: ResearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Run a research and stream tree snapshots until the run completes.
    pub fn run(
        &self,
        prompt: &str,
    ) -> impl Stream<Item = Result<Research, ResearchError>> + Send + 'static {
        self.run_with_cancel(prompt, CancellationToken::new())
    }

    /// Like [`run`](Researcher::run), with external cancellation.
    ///
    /// Cancelling the token promptly stops consuming new terms and
    /// documents; in-flight tasks finish or are abandoned when the run
    /// stream is dropped. The shared tree stays consistent either way.
    pub fn run_with_cancel(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Research, ResearchError>> + Send + 'static {
        let terms = self.terms.clone();
        let search = self.search.clone();
        let summarizer = self.summarizer.clone();
        let options = self.options.clone();
        let prompt = prompt.to_string();

        stream! {
            let tree = ResearchTree::new(&prompt);
            info!(id = %tree.id(), topic = %prompt, "starting research run");
            yield Ok(tree.snapshot());

            let term_stream = match terms
                .generate_terms(&prompt, options.terms_per_research)
                .await
            {
                Ok(stream) => stream,
                Err(err) => {
                    yield Err(ResearchError::TermGeneration(err));
                    return;
                }
            };
            let term_stream = term_stream.take_until(cancel.clone().cancelled_owned());

            let expand_tree = tree.clone();
            let expand_cancel = cancel.clone();
            let results_per_term = options.results_per_term;
            let mut events = merge_expand(term_stream, move |term| {
                expand_term(
                    term,
                    expand_tree.clone(),
                    search.clone(),
                    summarizer.clone(),
                    results_per_term,
                    expand_cancel.clone(),
                )
            });

            while let Some(event) = events.next().await {
                match event {
                    ResearchEvent::TermsFailed(err) => {
                        // Fatal: abandon whatever is still in flight.
                        cancel.cancel();
                        yield Err(ResearchError::TermGeneration(err));
                        return;
                    }
                    ResearchEvent::DocumentStarted if !options.emit_heartbeats => continue,
                    _ => yield Ok(tree.snapshot()),
                }
            }

            info!(id = %tree.id(), "research run complete");
        }
    }
}

/// Expansion for one search term: append the branch, then fan its documents
/// out through a nested merge.
fn expand_term(
    term: Result<String, TermError>,
    tree: ResearchTree,
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    results_per_term: usize,
    cancel: CancellationToken,
) -> BoxStream<'static, ResearchEvent> {
    let query = match term {
        Ok(query) => query,
        // Fatal: surfaced through the merge so the consumer can abort.
        Err(err) => {
            return futures_util::stream::once(async move { ResearchEvent::TermsFailed(err) })
                .boxed()
        }
    };

    debug!(query = %query, "expanding search term");
    // Appended here, synchronously: merge_expand invokes the expansion in
    // term-arrival order, which fixes branch order in the tree.
    let branch = tree.append_branch(&query);

    let documents = search
        .top_documents(&query, results_per_term)
        .take_until(cancel.cancelled_owned());
    let doc_events = merge_expand(documents, move |doc| {
        expand_document(doc, tree.clone(), branch, summarizer.clone())
    });

    futures_util::stream::once(async { ResearchEvent::BranchAdded })
        .chain(doc_events)
        .boxed()
}

/// Expansion for one document: heartbeat, summarize, append on success.
fn expand_document(
    doc: DocumentRef,
    tree: ResearchTree,
    branch: BranchId,
    summarizer: Arc<dyn Summarizer>,
) -> BoxStream<'static, ResearchEvent> {
    stream! {
        debug!(url = %doc.url, "processing document");
        yield ResearchEvent::DocumentStarted;

        match summarizer.summarize(&doc).await {
            Ok(paper) => {
                tree.append_leaf(branch, paper);
                yield ResearchEvent::LeafAdded;
            }
            Err(err) => {
                // Leaf-local: this document is dropped, the run continues.
                warn!(url = %doc.url, error = %err, "failed to summarize document");
            }
        }
    }
    .boxed()
}
