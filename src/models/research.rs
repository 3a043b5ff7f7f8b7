//! Research tree models: the root, its search branches, and summarized papers.

use serde::{Deserialize, Serialize};

/// A successfully summarized document.
///
/// Papers are only ever created for documents that made it through the full
/// download, extraction, and summarization pipeline; a failed document leaves
/// no trace in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Paper title as reported by the summarizer
    pub title: String,

    /// Brief summary of the paper's context, methodology, and conclusions
    pub summary: String,

    /// Source URL the document was fetched from
    pub url: String,

    /// Authors, when the summarizer could identify them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    /// Journal or other venue, when the summarizer could identify it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl Paper {
    /// Create a paper with the required fields
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            url: url.into(),
            authors: None,
            publisher: None,
        }
    }

    /// Set the author list
    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = Some(authors);
        self
    }

    /// Set the publisher
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }
}

/// One search term and the papers discovered for it.
///
/// Branches are created when a term is fanned out and only ever grow:
/// papers are appended in the order their document tasks complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBranch {
    /// The search query this branch was created for
    pub query: String,

    /// Summarized papers, in document-task completion order
    pub papers: Vec<Paper>,
}

impl SearchBranch {
    /// Create an empty branch for a query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            papers: Vec::new(),
        }
    }
}

/// The root of one research run: the original topic and all branches.
///
/// Serializes to `{id, prompt, searches: [{query, papers: [..]}]}`, the shape
/// the output sink consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Research {
    /// Opaque run identifier, unique per research run
    pub id: String,

    /// The user's original topic
    pub prompt: String,

    /// Branches in term-arrival order
    pub searches: Vec<SearchBranch>,
}

impl Research {
    /// Total number of papers across all branches
    pub fn paper_count(&self) -> usize {
        self.searches.iter().map(|s| s.papers.len()).sum()
    }

    /// Whether `self` contains every branch and paper of `earlier`, in order.
    ///
    /// Snapshots of one run always satisfy this pairwise: the tree only grows.
    pub fn is_superset_of(&self, earlier: &Research) -> bool {
        if self.id != earlier.id || self.searches.len() < earlier.searches.len() {
            return false;
        }
        earlier.searches.iter().zip(&self.searches).all(|(old, new)| {
            old.query == new.query
                && old.papers.len() <= new.papers.len()
                && old.papers.iter().zip(&new.papers).all(|(a, b)| a == b)
        })
    }
}

/// A point-in-time copy of the tree, tagged with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSnapshot {
    /// Monotonic sequence number, starting at 0
    pub order: u64,

    /// Full tree state at the moment of emission
    pub research: Research,
}

/// One record of the caller-visible snapshot stream.
///
/// A run either ends with a single [`SnapshotEvent::Done`] terminal marker,
/// or with a single [`SnapshotEvent::Failed`] record when term generation
/// failed; never both, never neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotEvent {
    /// A numbered tree snapshot
    Snapshot(ResearchSnapshot),

    /// The run failed fatally; no terminal marker follows
    Failed {
        /// Human-readable description of the fatal error
        message: String,
    },

    /// Terminal marker: no further snapshots will be produced
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn research_with(searches: Vec<SearchBranch>) -> Research {
        Research {
            id: "run-1".to_string(),
            prompt: "topic".to_string(),
            searches,
        }
    }

    #[test]
    fn test_paper_builder_methods() {
        let paper = Paper::new("Title", "Summary", "https://example.com/a.pdf")
            .with_authors(vec!["A. Author".to_string()])
            .with_publisher("Example Press");

        assert_eq!(paper.title, "Title");
        assert_eq!(paper.authors.as_deref(), Some(&["A. Author".to_string()][..]));
        assert_eq!(paper.publisher.as_deref(), Some("Example Press"));
    }

    #[test]
    fn test_paper_serializes_without_absent_optionals() {
        let paper = Paper::new("T", "S", "https://example.com");
        let json = serde_json::to_value(&paper).unwrap();

        assert!(json.get("authors").is_none());
        assert!(json.get("publisher").is_none());
    }

    #[test]
    fn test_superset_detects_growth() {
        let old = research_with(vec![SearchBranch::new("a")]);

        let mut new = old.clone();
        new.searches[0]
            .papers
            .push(Paper::new("T", "S", "https://example.com"));
        new.searches.push(SearchBranch::new("b"));

        assert!(new.is_superset_of(&old));
        assert!(!old.is_superset_of(&new));
    }

    #[test]
    fn test_superset_rejects_diverged_branches() {
        let old = research_with(vec![SearchBranch::new("a")]);
        let other = research_with(vec![SearchBranch::new("b")]);

        assert!(!other.is_superset_of(&old));
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = ResearchSnapshot {
            order: 3,
            research: research_with(vec![SearchBranch::new("a")]),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["order"], 3);
        assert_eq!(json["research"]["prompt"], "topic");
        assert_eq!(json["research"]["searches"][0]["query"], "a");
    }
}
