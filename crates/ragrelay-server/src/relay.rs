//! Stream relay.
//!
//! Copies a backend stream to an HTTP response body as items arrive. Each
//! relayed response moves through
//!
//! ```text
//! Idle -> Streaming -> Completed | Aborted | Errored
//! ```
//!
//! Headers are committed when the response is returned, before the first
//! backend item is read. Nothing is buffered or coalesced: one backend item
//! becomes at most one body frame, in arrival order.
//!
//! A failure with no room for an error record in the output format ends the
//! body with an error item, so the transfer is aborted without its final
//! chunk and the client sees a truncated response rather than a clean end.
//!
//! When the client goes away, axum drops the body stream. That drops the
//! backend stream with it, which closes the backend transport; the drop is
//! recorded as `Aborted`.

use std::fmt::Display;
use std::io;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use ragrelay_llm::{PullProgressEvent, StreamChunk};
use serde::Serialize;
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Frame Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// What to do with one backend item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Write these bytes to the body.
    Write(Bytes),
    /// The item marks completion; end the body without writing it.
    Finish,
}

/// Turns backend items into body frames.
pub trait FrameEncoder<T>: Send + 'static {
    /// Encode one item.
    fn encode(&mut self, item: &T) -> Frame;

    /// Final record to write when the backend fails mid-stream, if the
    /// output format has room for one.
    fn encode_error(&self, message: &str) -> Option<Bytes>;
}

#[derive(Serialize)]
struct TextRecord<'a> {
    id: u64,
    text: &'a str,
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    error: &'a str,
}

fn json_line<T: Serialize>(value: &T) -> Bytes {
    let mut line = serde_json::to_vec(value).unwrap_or_default();
    line.push(b'\n');
    Bytes::from(line)
}

/// Chat output encoder.
///
/// With a correlation id every chunk becomes a `{"id":..,"text":..}` line;
/// without one the text is written raw.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatEncoder {
    id: Option<u64>,
}

impl ChatEncoder {
    pub fn new(id: Option<u64>) -> Self {
        Self { id }
    }
}

impl FrameEncoder<StreamChunk> for ChatEncoder {
    fn encode(&mut self, item: &StreamChunk) -> Frame {
        match item {
            StreamChunk::Done => Frame::Finish,
            StreamChunk::TextDelta { text } => match self.id {
                Some(id) => Frame::Write(json_line(&TextRecord { id, text })),
                None => Frame::Write(Bytes::from(text.clone())),
            },
        }
    }

    fn encode_error(&self, message: &str) -> Option<Bytes> {
        self.id.map(|id| {
            json_line(&ErrorRecord {
                id: Some(id),
                error: message,
            })
        })
    }
}

/// Pull progress encoder: one JSON object per line; the `done` event ends
/// the stream and is not written.
#[derive(Debug, Clone, Copy, Default)]
pub struct PullEncoder;

impl FrameEncoder<PullProgressEvent> for PullEncoder {
    fn encode(&mut self, item: &PullProgressEvent) -> Frame {
        if item.done {
            Frame::Finish
        } else {
            Frame::Write(json_line(item))
        }
    }

    fn encode_error(&self, message: &str) -> Option<Bytes> {
        Some(json_line(&ErrorRecord {
            id: None,
            error: message,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relay State
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of one relayed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming,
    Completed,
    Aborted,
    Errored,
}

/// Options for a relayed response.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Label used in log events (`chat`, `pull`).
    pub label: &'static str,
    /// Abort when the backend produces nothing for this long.
    pub idle_timeout: Duration,
}

impl RelayOptions {
    pub fn new(label: &'static str, idle_timeout: Duration) -> Self {
        Self {
            label,
            idle_timeout,
        }
    }
}

/// Tracks the relay state; a drop while still streaming is a disconnect.
struct RelayTracker {
    label: &'static str,
    state: RelayState,
    frames: usize,
    started: Instant,
}

impl RelayTracker {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            state: RelayState::Idle,
            frames: 0,
            started: Instant::now(),
        }
    }

    fn streaming(&mut self) {
        self.state = RelayState::Streaming;
    }

    fn complete(&mut self) {
        self.state = RelayState::Completed;
        info!(
            relay = self.label,
            frames = self.frames,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Stream completed"
        );
    }

    fn fail(&mut self, error: &str) {
        self.state = RelayState::Errored;
        warn!(
            relay = self.label,
            frames = self.frames,
            error,
            "Stream failed mid-response"
        );
    }
}

impl Drop for RelayTracker {
    fn drop(&mut self) {
        if self.state == RelayState::Streaming {
            self.state = RelayState::Aborted;
            info!(
                relay = self.label,
                frames = self.frames,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "Client disconnected, backend stream dropped"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relay
// ─────────────────────────────────────────────────────────────────────────────

/// Encode a backend stream into body chunks.
///
/// The returned stream is lazy: the backend is polled only when the HTTP
/// layer asks for the next chunk.
pub fn relay_body<T, E, S, Enc>(
    stream: S,
    mut encoder: Enc,
    options: RelayOptions,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static
where
    T: Send + 'static,
    E: Display + Send + 'static,
    S: Stream<Item = Result<T, E>> + Send + 'static,
    Enc: FrameEncoder<T>,
{
    async_stream::stream! {
        let mut tracker = RelayTracker::new(options.label);
        tracker.streaming();

        let mut stream = std::pin::pin!(stream);
        loop {
            let failure = match tokio::time::timeout(options.idle_timeout, stream.next()).await {
                Ok(Some(Ok(item))) => match encoder.encode(&item) {
                    Frame::Write(bytes) => {
                        tracker.frames += 1;
                        yield Ok::<Bytes, io::Error>(bytes);
                        continue;
                    }
                    Frame::Finish => {
                        tracker.complete();
                        break;
                    }
                },
                Ok(Some(Err(e))) => e.to_string(),
                Ok(None) => "stream ended before completion".to_string(),
                Err(_) => format!(
                    "no output from backend for {}s",
                    options.idle_timeout.as_secs()
                ),
            };

            tracker.fail(&failure);
            match encoder.encode_error(&failure) {
                Some(record) => yield Ok(record),
                None => yield Err(io::Error::other(failure)),
            }
            break;
        }
    }
}

/// Build a streaming response over a backend stream.
pub fn relay<T, E, S, Enc>(stream: S, encoder: Enc, options: RelayOptions) -> Response
where
    T: Send + 'static,
    E: Display + Send + 'static,
    S: Stream<Item = Result<T, E>> + Send + 'static,
    Enc: FrameEncoder<T>,
{
    let mut response = Response::new(Body::from_stream(relay_body(stream, encoder, options)));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));

    response
}
