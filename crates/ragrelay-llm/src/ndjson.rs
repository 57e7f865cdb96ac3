//! Newline-delimited JSON framing.
//!
//! The model-serving API streams one JSON object per line. HTTP chunk
//! boundaries do not line up with those lines, so bytes are buffered until a
//! full line is available. Buffering happens on raw bytes so multi-byte UTF-8
//! sequences split across chunks are reassembled before decoding.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use thiserror::Error;

/// Longest line accepted before the stream is failed (1 MiB).
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Error produced by the line stream.
#[derive(Debug, Error, PartialEq)]
pub enum LineError<E> {
    /// The underlying byte stream failed.
    #[error("{0}")]
    Read(E),

    /// A line grew past the limit without a newline.
    #[error("line exceeds {limit} bytes without a newline")]
    TooLong { limit: usize },
}

struct LineState<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    max_line: usize,
    exhausted: bool,
}

/// Split a byte stream into trimmed, non-empty text lines.
///
/// A trailing line without a final newline is flushed when the inner stream
/// ends. An error from the inner stream, or a line longer than
/// [`MAX_LINE_BYTES`], is forwarded once and ends the line stream; any
/// partial line buffered at that point is discarded.
pub fn lines<S, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<String, LineError<E>>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    lines_with_limit(byte_stream, MAX_LINE_BYTES)
}

/// [`lines`] with an explicit maximum line length.
pub fn lines_with_limit<S, E>(
    byte_stream: S,
    max_line: usize,
) -> impl Stream<Item = Result<String, LineError<E>>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    futures::stream::unfold(
        LineState {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            scanned: 0,
            max_line,
            exhausted: false,
        },
        |mut state| async move {
            loop {
                if let Some(offset) = state.buffer[state.scanned..]
                    .iter()
                    .position(|&b| b == b'\n')
                {
                    let raw: Vec<u8> = state.buffer.drain(..=state.scanned + offset).collect();
                    state.scanned = 0;
                    let line = String::from_utf8_lossy(&raw).trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    return Some((Ok(line), state));
                }
                state.scanned = state.buffer.len();

                if state.exhausted {
                    let rest = std::mem::take(&mut state.buffer);
                    state.scanned = 0;
                    let line = String::from_utf8_lossy(&rest).trim().to_string();
                    if line.is_empty() {
                        return None;
                    }
                    return Some((Ok(line), state));
                }

                if state.buffer.len() > state.max_line {
                    state.exhausted = true;
                    state.buffer.clear();
                    state.scanned = 0;
                    let limit = state.max_line;
                    return Some((Err(LineError::TooLong { limit }), state));
                }

                match state.inner.next().await {
                    Some(Ok(bytes)) => state.buffer.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        state.exhausted = true;
                        state.buffer.clear();
                        state.scanned = 0;
                        return Some((Err(LineError::Read(e)), state));
                    }
                    None => state.exhausted = true,
                }
            }
        },
    )
}
