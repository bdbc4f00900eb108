//! Decoded stream events, accumulation, and the cancellable decode loop.
//!
//! ```rust
//! use tprovider::{StreamDecoder, WireFormat};
//!
//! let mut decoder = StreamDecoder::new(WireFormat::OpenAiCompatible);
//! decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"cho");
//! decoder.feed(b"ices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n");
//! let result = decoder.finish().into_result(false);
//!
//! assert_eq!(result.text, "Hello");
//! ```

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::adapters::{FrameDecoder, WireFormat};
use crate::{Citation, ProviderError, SearchQuery, StreamResult};

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    TextDelta(String),
    SearchQuery(SearchQuery),
    Citation(Citation),
}

/// Receives decoder output as it is produced.
///
/// `on_text` always receives the full accumulated text, so every call extends the previous
/// value.
pub trait StreamObserver: Send + Sync {
    fn on_text(&self, _accumulated: &str) {}

    fn on_search_query(&self, _query: &SearchQuery) {}

    fn on_citation(&self, _citation: &Citation) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStreamObserver;

impl StreamObserver for NoopStreamObserver {}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamAccumulator {
    pub text: String,
    pub search_queries: Vec<SearchQuery>,
    pub citations: Vec<Citation>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: DecodedEvent, observer: &dyn StreamObserver) {
        match event {
            DecodedEvent::TextDelta(text) => {
                if text.is_empty() {
                    return;
                }
                self.text.push_str(&text);
                observer.on_text(&self.text);
            }
            DecodedEvent::SearchQuery(query) => {
                observer.on_search_query(&query);
                self.search_queries.push(query);
            }
            DecodedEvent::Citation(citation) => {
                observer.on_citation(&citation);
                self.citations.push(citation);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.search_queries.is_empty() && self.citations.is_empty()
    }

    pub fn into_result(self, aborted: bool) -> StreamResult {
        StreamResult {
            text: self.text,
            search_queries: self.search_queries,
            citations: self.citations,
            aborted,
            fallback_info: None,
        }
    }
}

/// Incremental decoder for one response body: framing, dialect decoding and accumulation.
pub struct StreamDecoder {
    format: WireFormat,
    frames: crate::SseFrameBuffer,
    decoder: Box<dyn FrameDecoder>,
    accumulator: StreamAccumulator,
}

impl StreamDecoder {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            frames: crate::SseFrameBuffer::new(),
            decoder: format.decoder(),
            accumulator: StreamAccumulator::new(),
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        self.feed_observed(chunk, &NoopStreamObserver);
    }

    pub fn feed_observed(&mut self, chunk: &[u8], observer: &dyn StreamObserver) {
        for payload in self.frames.push(chunk) {
            self.decode_payload(&payload, observer);
        }
    }

    pub fn accumulated(&self) -> &StreamAccumulator {
        &self.accumulator
    }

    pub fn finish(self) -> StreamAccumulator {
        self.finish_observed(&NoopStreamObserver)
    }

    /// Flushes any unterminated trailing line and returns everything accumulated.
    pub fn finish_observed(mut self, observer: &dyn StreamObserver) -> StreamAccumulator {
        if let Some(payload) = self.frames.finish() {
            self.decode_payload(&payload, observer);
        }
        self.accumulator
    }

    fn decode_payload(&mut self, payload: &str, observer: &dyn StreamObserver) {
        if payload == DONE_SENTINEL {
            return;
        }

        match self.decoder.decode_frame(payload) {
            Ok(events) => {
                for event in events {
                    self.accumulator.apply(event, observer);
                }
            }
            Err(error) => {
                tracing::debug!(
                    phase = "decode",
                    format = ?self.format,
                    error = %error,
                    "skipping malformed stream frame"
                );
            }
        }
    }
}

impl std::fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("format", &self.format)
            .field("frames", &self.frames)
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    pub accumulated: StreamAccumulator,
    pub aborted: bool,
}

impl DecodeOutcome {
    pub fn into_result(self) -> StreamResult {
        self.accumulated.into_result(self.aborted)
    }
}

/// Drives `chunks` to completion, racing every read against `token`.
///
/// Cancellation is not an error: it yields `aborted: true` with whatever had been decoded. A
/// transport error mid-stream is returned as-is.
pub async fn decode_stream<S>(
    format: WireFormat,
    chunks: S,
    token: &CancellationToken,
    observer: &dyn StreamObserver,
) -> Result<DecodeOutcome, ProviderError>
where
    S: Stream<Item = Result<Bytes, ProviderError>> + Send,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut decoder = StreamDecoder::new(format);

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                return Ok(DecodeOutcome {
                    accumulated: decoder.accumulator,
                    aborted: true,
                });
            }
            next = chunks.next() => next,
        };

        match next {
            Some(chunk) => decoder.feed_observed(&chunk?, observer),
            None => break,
        }
    }

    Ok(DecodeOutcome {
        accumulated: decoder.finish_observed(observer),
        aborted: false,
    })
}
