//! Integration tests for the research aggregation engine.
//!
//! These run whole research flows against scripted mock producers and
//! assert the stream-level contracts: ordering, failure isolation,
//! monotonic snapshots, and termination.

use futures_util::StreamExt;
use research_stream::models::{Paper, Research, SnapshotEvent};
use research_stream::producers::{MockSearchProvider, MockSummarizer, MockTermSource, TermError};
use research_stream::research::{sequence_snapshots, ResearchOptions, Researcher};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn paper(title: &str, url: &str) -> Paper {
    Paper::new(title, format!("summary of {title}"), url)
}

struct Fixture {
    terms: Arc<MockTermSource>,
    search: Arc<MockSearchProvider>,
    summarizer: Arc<MockSummarizer>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            terms: Arc::new(MockTermSource::new()),
            search: Arc::new(MockSearchProvider::new()),
            summarizer: Arc::new(MockSummarizer::new()),
        }
    }

    fn researcher(&self) -> Researcher {
        Researcher::new(
            self.terms.clone(),
            self.search.clone(),
            self.summarizer.clone(),
        )
    }
}

/// Run a research to completion, with a hang guard.
async fn run_to_end(researcher: &Researcher, topic: &str) -> Vec<SnapshotEvent> {
    let events = sequence_snapshots(researcher.run(topic));
    tokio::time::timeout(Duration::from_secs(5), events.collect::<Vec<_>>())
        .await
        .expect("research run must terminate")
}

fn snapshots(events: &[SnapshotEvent]) -> Vec<&Research> {
    events
        .iter()
        .filter_map(|event| match event {
            SnapshotEvent::Snapshot(s) => Some(&s.research),
            _ => None,
        })
        .collect()
}

fn final_tree(events: &[SnapshotEvent]) -> &Research {
    snapshots(events).pop().expect("at least one snapshot")
}

#[tokio::test]
async fn test_two_term_scenario_builds_expected_tree() {
    let fixture = Fixture::new();
    fixture.terms.push_term("a");
    fixture.terms.push_term("b");
    fixture
        .search
        .set_results("a", &["https://ex.com/a1.pdf", "https://ex.com/a2.pdf"]);
    fixture.search.set_results("b", &["https://ex.com/b1.pdf"]);
    fixture
        .summarizer
        .succeed("https://ex.com/a1.pdf", paper("L1", "https://ex.com/a1.pdf"));
    fixture.summarizer.fail("https://ex.com/a2.pdf");
    fixture
        .summarizer
        .succeed("https://ex.com/b1.pdf", paper("L2", "https://ex.com/b1.pdf"));

    let events = run_to_end(&fixture.researcher(), "X").await;

    // The stream ends with the terminal marker, not a failure.
    assert_eq!(events.last(), Some(&SnapshotEvent::Done));

    let tree = final_tree(&events);
    assert_eq!(tree.prompt, "X");
    assert_eq!(tree.searches.len(), 2);
    assert_eq!(tree.searches[0].query, "a");
    assert_eq!(tree.searches[1].query, "b");
    assert_eq!(tree.searches[0].papers.len(), 1);
    assert_eq!(tree.searches[0].papers[0].title, "L1");
    assert_eq!(tree.searches[1].papers.len(), 1);
    assert_eq!(tree.searches[1].papers[0].title, "L2");

    // Sequence numbers strictly increase from 0.
    let orders: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            SnapshotEvent::Snapshot(s) => Some(s.order),
            _ => None,
        })
        .collect();
    let expected: Vec<u64> = (0..orders.len() as u64).collect();
    assert_eq!(orders, expected);
}

#[tokio::test]
async fn test_leaves_appear_in_completion_order() {
    let fixture = Fixture::new();
    fixture.terms.push_term("t");
    fixture
        .search
        .set_results("t", &["https://ex.com/slow.pdf", "https://ex.com/fast.pdf"]);
    // The slow document is spawned first but must be appended second.
    fixture.summarizer.succeed_after(
        "https://ex.com/slow.pdf",
        paper("Slow", "https://ex.com/slow.pdf"),
        Duration::from_millis(100),
    );
    fixture.summarizer.succeed_after(
        "https://ex.com/fast.pdf",
        paper("Fast", "https://ex.com/fast.pdf"),
        Duration::from_millis(10),
    );

    let events = run_to_end(&fixture.researcher(), "topic").await;
    let tree = final_tree(&events);

    let titles: Vec<&str> = tree.searches[0]
        .papers
        .iter()
        .map(|p| p.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Fast", "Slow"]);
}

#[tokio::test]
async fn test_summarize_failure_is_isolated_to_one_leaf() {
    let fixture = Fixture::new();
    fixture.terms.push_term("k");
    fixture.terms.push_term("other");
    fixture.search.set_results(
        "k",
        &[
            "https://ex.com/k1.pdf",
            "https://ex.com/k2.pdf",
            "https://ex.com/k3.pdf",
        ],
    );
    fixture.search.set_results("other", &["https://ex.com/o1.pdf"]);
    fixture
        .summarizer
        .succeed("https://ex.com/k1.pdf", paper("K1", "https://ex.com/k1.pdf"));
    fixture.summarizer.fail("https://ex.com/k2.pdf");
    fixture
        .summarizer
        .succeed("https://ex.com/k3.pdf", paper("K3", "https://ex.com/k3.pdf"));
    fixture
        .summarizer
        .succeed("https://ex.com/o1.pdf", paper("O1", "https://ex.com/o1.pdf"));

    let events = run_to_end(&fixture.researcher(), "topic").await;
    let tree = final_tree(&events);

    // Exactly K-1 leaves in the degraded branch; the sibling is untouched.
    assert_eq!(tree.searches[0].papers.len(), 2);
    assert_eq!(tree.searches[1].papers.len(), 1);
    assert_eq!(events.last(), Some(&SnapshotEvent::Done));
}

#[tokio::test]
async fn test_immediate_term_failure_ends_with_error_record() {
    let fixture = Fixture::new();
    fixture
        .terms
        .fail_on_start(TermError::Api("no model available".to_string()));

    let events = run_to_end(&fixture.researcher(), "topic").await;

    // Initial empty-tree snapshot, then the failure record, never Done.
    assert_eq!(events.len(), 2);
    match &events[0] {
        SnapshotEvent::Snapshot(s) => {
            assert_eq!(s.order, 0);
            assert!(s.research.searches.is_empty());
        }
        other => panic!("expected initial snapshot, got {other:?}"),
    }
    match &events[1] {
        SnapshotEvent::Failed { message } => assert!(message.contains("no model available")),
        other => panic!("expected failure record, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mid_stream_term_failure_is_fatal() {
    let fixture = Fixture::new();
    fixture.terms.push_term("a");
    fixture
        .terms
        .push_failure(TermError::Stream("connection dropped".to_string()));
    fixture.search.set_results("a", &["https://ex.com/a1.pdf"]);
    fixture
        .summarizer
        .succeed("https://ex.com/a1.pdf", paper("A1", "https://ex.com/a1.pdf"));

    let events = run_to_end(&fixture.researcher(), "topic").await;

    assert!(matches!(events.last(), Some(SnapshotEvent::Failed { .. })));
    assert!(!events.contains(&SnapshotEvent::Done));
}

#[tokio::test]
async fn test_snapshots_grow_monotonically() {
    let fixture = Fixture::new();
    fixture.terms.push_term("a");
    fixture.terms.push_term("b");
    fixture
        .search
        .set_results("a", &["https://ex.com/a1.pdf", "https://ex.com/a2.pdf"]);
    fixture
        .search
        .set_results("b", &["https://ex.com/b1.pdf", "https://ex.com/b2.pdf"]);
    // Interleave completions across branches.
    for (url, title, ms) in [
        ("https://ex.com/a1.pdf", "A1", 40),
        ("https://ex.com/a2.pdf", "A2", 10),
        ("https://ex.com/b1.pdf", "B1", 30),
        ("https://ex.com/b2.pdf", "B2", 20),
    ] {
        fixture
            .summarizer
            .succeed_after(url, paper(title, url), Duration::from_millis(ms));
    }

    let events = run_to_end(&fixture.researcher(), "topic").await;
    let trees = snapshots(&events);

    assert!(trees.len() >= 7);
    for pair in trees.windows(2) {
        assert!(
            pair[1].is_superset_of(pair[0]),
            "snapshot went backward: {:?} after {:?}",
            pair[1],
            pair[0]
        );
    }
    assert_eq!(final_tree(&events).paper_count(), 4);
}

#[tokio::test]
async fn test_terminates_when_every_document_fails() {
    let fixture = Fixture::new();
    fixture.terms.push_term("a");
    fixture.terms.push_term("b");
    fixture
        .search
        .set_results("a", &["https://ex.com/a1.pdf", "https://ex.com/a2.pdf"]);
    fixture.search.set_results("b", &["https://ex.com/b1.pdf"]);
    fixture.summarizer.fail("https://ex.com/a1.pdf");
    fixture.summarizer.fail("https://ex.com/a2.pdf");
    fixture.summarizer.fail("https://ex.com/b1.pdf");

    let events = run_to_end(&fixture.researcher(), "topic").await;

    assert_eq!(events.last(), Some(&SnapshotEvent::Done));
    let tree = final_tree(&events);
    assert_eq!(tree.searches.len(), 2);
    assert_eq!(tree.paper_count(), 0);
}

#[tokio::test]
async fn test_term_limit_caps_branch_count() {
    let fixture = Fixture::new();
    for term in ["a", "b", "c", "d", "e"] {
        fixture.terms.push_term(term);
    }

    let researcher = fixture.researcher().with_options(ResearchOptions {
        terms_per_research: 2,
        ..ResearchOptions::default()
    });
    let events = run_to_end(&researcher, "topic").await;
    let tree = final_tree(&events);

    assert!(tree.searches.len() <= 2);
    assert!(tree.searches.iter().all(|s| !s.query.is_empty()));
}

#[tokio::test]
async fn test_heartbeats_are_suppressed_by_default() {
    let scripted = |fixture: &Fixture| {
        fixture.terms.push_term("t");
        fixture.search.set_results("t", &["https://ex.com/d.pdf"]);
        // The delay keeps the leaf from landing before the heartbeat
        // snapshot is taken.
        fixture.summarizer.succeed_after(
            "https://ex.com/d.pdf",
            paper("D", "https://ex.com/d.pdf"),
            Duration::from_millis(50),
        );
    };

    let quiet = Fixture::new();
    scripted(&quiet);
    let quiet_events = run_to_end(&quiet.researcher(), "topic").await;
    // initial + branch + leaf, then Done.
    assert_eq!(snapshots(&quiet_events).len(), 3);

    let chatty = Fixture::new();
    scripted(&chatty);
    let researcher = chatty.researcher().with_options(ResearchOptions {
        emit_heartbeats: true,
        ..ResearchOptions::default()
    });
    let chatty_events = run_to_end(&researcher, "topic").await;
    let chatty_trees = snapshots(&chatty_events);
    // One extra, structurally identical snapshot when the document starts.
    assert_eq!(chatty_trees.len(), 4);
    assert_eq!(chatty_trees[1], chatty_trees[2]);
}

#[tokio::test]
async fn test_cancellation_stops_promptly_without_hanging() {
    let fixture = Fixture::new();
    for term in ["a", "b", "c"] {
        fixture.terms.push_term(term);
        let url = format!("https://ex.com/{term}.pdf");
        fixture.search.set_results(term, &[url.as_str()]);
        fixture
            .summarizer
            .succeed_after(&url, paper(term, &url), Duration::from_millis(50));
    }
    fixture.terms.set_delay(Duration::from_millis(20));

    let cancel = CancellationToken::new();
    let researcher = fixture.researcher();
    let events = sequence_snapshots(researcher.run_with_cancel("topic", cancel.clone()));
    futures_util::pin_mut!(events);

    // Cancel as soon as the first branch shows up.
    let mut seen = Vec::new();
    let collected = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.next().await {
            if let SnapshotEvent::Snapshot(s) = &event {
                if !s.research.searches.is_empty() {
                    cancel.cancel();
                }
            }
            seen.push(event);
        }
        seen
    })
    .await
    .expect("cancelled run must still terminate");

    // The run winds down with the terminal marker and spawned no further
    // branches after cancellation.
    assert_eq!(collected.last(), Some(&SnapshotEvent::Done));
    let trees: Vec<&Research> = collected
        .iter()
        .filter_map(|event| match event {
            SnapshotEvent::Snapshot(s) => Some(&s.research),
            _ => None,
        })
        .collect();
    assert!(trees.last().unwrap().searches.len() < 3);
}
