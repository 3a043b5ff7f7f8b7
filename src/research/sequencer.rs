//! Snapshot sequencing: monotonic numbering plus the terminal marker.

use async_stream::stream;
use futures_util::{Stream, StreamExt};

use crate::models::{Research, ResearchSnapshot, SnapshotEvent};
use crate::research::ResearchError;

/// Number the orchestrator's snapshots `0,1,2,…` in observation order and
/// close the stream with exactly one terminal record.
///
/// A normal end yields [`SnapshotEvent::Done`]; a fatal run error yields
/// [`SnapshotEvent::Failed`] instead and nothing after it. Snapshots are
/// never reordered or renumbered; the sequence number is bookkeeping for the
/// downstream sink, nothing more.
pub fn sequence_snapshots<S>(updates: S) -> impl Stream<Item = SnapshotEvent> + Send
where
    S: Stream<Item = Result<Research, ResearchError>> + Send + 'static,
{
    stream! {
        let mut order: u64 = 0;
        futures_util::pin_mut!(updates);
        while let Some(update) = updates.next().await {
            match update {
                Ok(research) => {
                    yield SnapshotEvent::Snapshot(ResearchSnapshot { order, research });
                    order += 1;
                }
                Err(err) => {
                    yield SnapshotEvent::Failed {
                        message: err.to_string(),
                    };
                    return;
                }
            }
        }
        yield SnapshotEvent::Done;
    }
}
