//! Line re-chunking for streamed completions.
//!
//! Completion deltas arrive in arbitrary fragments; the term source needs
//! whole lines. [`split_lines`] buffers partial lines across fragments and
//! yields each complete, non-empty line once.

use async_stream::stream;
use futures_util::{Stream, StreamExt};

use crate::llm::LlmError;

/// Reassemble a fragmented text stream into complete lines.
///
/// Whitespace-only lines are skipped; a trailing partial line is flushed
/// when the input ends. An error item is passed through and ends the
/// stream.
pub fn split_lines<S>(
    chunks: S,
) -> impl Stream<Item = Result<String, LlmError>> + Send + 'static
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    stream! {
        let mut buffer = String::new();
        futures_util::pin_mut!(chunks);
        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };
            buffer.push_str(&chunk);

            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                let line = line.trim();
                if !line.is_empty() {
                    yield Ok(line.to_string());
                }
            }
        }

        let tail = buffer.trim();
        if !tail.is_empty() {
            yield Ok(tail.to_string());
        }
    }
}
