//! Generic fan-out/fan-in stream merging.
//!
//! [`merge_expand`] is the engine behind the two-level research fan-out:
//! every input item is expanded into its own concurrently-running stream and
//! all expansion outputs are merged into a single sequence in completion
//! order. Nesting one `merge_expand` inside the expansion of another gives
//! the terms -> documents pipeline its shape.

use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// The merged output of [`merge_expand`].
///
/// Yields expansion values in the order they become available. The stream
/// ends only once the input sequence has ended and every spawned expansion
/// has run to completion. Dropping it closes the underlying channel, which
/// the driver and all expansion tasks observe promptly and exit.
#[derive(Debug)]
pub struct MergedStream<O> {
    rx: mpsc::UnboundedReceiver<O>,
}

impl<O> Stream for MergedStream<O> {
    type Item = O;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<O>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Fan each input item out into its own concurrent expansion stream and
/// merge everything the expansions produce into one output stream.
///
/// `expand` is invoked synchronously, in input-arrival order, before the
/// expansion is spawned; side effects inside `expand` therefore happen in
/// input order even though the expansions themselves race. Values are merged
/// in completion order, not spawn order.
///
/// The set of live channel senders (the driver plus one clone per expansion)
/// is the outstanding-work counter: the output closes exactly once, when the
/// last sender drops. An expansion that panics only loses its own remaining
/// values; the task boundary isolates it from the driver and its siblings.
pub fn merge_expand<S, F, X>(input: S, mut expand: F) -> MergedStream<X::Item>
where
    S: Stream + Send + 'static,
    S::Item: Send + 'static,
    F: FnMut(S::Item) -> X + Send + 'static,
    X: Stream + Send + 'static,
    X::Item: Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        futures_util::pin_mut!(input);
        loop {
            let item = tokio::select! {
                // Consumer went away: stop pulling new work.
                _ = tx.closed() => break,
                item = input.next() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            let expansion = expand(item);
            let branch_tx = tx.clone();
            tokio::spawn(async move {
                futures_util::pin_mut!(expansion);
                loop {
                    let value = tokio::select! {
                        _ = branch_tx.closed() => break,
                        value = expansion.next() => match value {
                            Some(value) => value,
                            None => break,
                        },
                    };
                    if branch_tx.send(value).is_err() {
                        break;
                    }
                }
            });
        }
        // Driver sender drops here; the channel closes once the last
        // expansion task finishes.
    });

    MergedStream { rx }
}
