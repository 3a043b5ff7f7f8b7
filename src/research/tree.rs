//! Shared mutable research tree with atomic append operations.

use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Paper, Research, SearchBranch};

/// Handle to a branch appended to a [`ResearchTree`].
///
/// Branches are append-only and never removed, so the handle stays valid for
/// the lifetime of the tree it was issued by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchId(usize);

/// The shared hierarchical state of one research run.
///
/// All clones refer to the same underlying tree. Appends are atomic with
/// respect to concurrent callers and never yield mid-mutation, so a
/// [`snapshot`](ResearchTree::snapshot) always observes a fully-applied
/// prefix of the mutation history: branches in term-arrival order, papers in
/// completion order, nothing half-written.
#[derive(Debug, Clone)]
pub struct ResearchTree {
    inner: Arc<Mutex<Research>>,
}

impl ResearchTree {
    /// Create a fresh tree for a topic, with a unique run identifier.
    pub fn new(prompt: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Research {
                id: Uuid::new_v4().to_string(),
                prompt: prompt.to_string(),
                searches: Vec::new(),
            })),
        }
    }

    /// Append an empty branch for a query and return its handle.
    ///
    /// The branch is fully formed (query set, paper list empty) before the
    /// lock is released; no reader can observe it otherwise.
    pub fn append_branch(&self, query: &str) -> BranchId {
        let mut research = self.inner.lock();
        research.searches.push(SearchBranch::new(query));
        BranchId(research.searches.len() - 1)
    }

    /// Append a summarized paper to a branch.
    pub fn append_leaf(&self, branch: BranchId, paper: Paper) {
        let mut research = self.inner.lock();
        research.searches[branch.0].papers.push(paper);
    }

    /// Take a consistent copy of the current tree state.
    pub fn snapshot(&self) -> Research {
        self.inner.lock().clone()
    }

    /// The run identifier.
    pub fn id(&self) -> String {
        self.inner.lock().id.clone()
    }
}
