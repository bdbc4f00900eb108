//! Stream Session: one cancellable in-flight request plus its observable progress.
//!
//! Every `start` replaces the session's cancellation token, cancelling whatever was running
//! before, so at most one network operation is live per session. Progress is mirrored into a
//! [`StreamSnapshot`] that callers can poll while a stream runs.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::{
    ChatRequest, ChatTransport, Citation, DecodeOutcome, ProviderError, SearchQuery,
    StreamAccumulator, StreamObserver, StreamResult, WireFormat, decode_stream,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub text: String,
    pub search_queries: Vec<SearchQuery>,
    pub citations: Vec<Citation>,
    pub is_streaming: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct ActiveStream {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Handle for one `begin`..`finish` span. Stale tickets never touch the snapshot.
#[derive(Debug, Clone)]
pub(crate) struct StreamTicket {
    generation: u64,
    pub(crate) token: CancellationToken,
}

#[derive(Debug)]
pub struct StreamSession {
    transport: Arc<dyn ChatTransport>,
    active: Mutex<ActiveStream>,
    snapshot: Mutex<StreamSnapshot>,
}

impl StreamSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            active: Mutex::new(ActiveStream::default()),
            snapshot: Mutex::new(StreamSnapshot::default()),
        }
    }

    /// Streams one request to completion or cancellation.
    pub async fn start(
        &self,
        request: ChatRequest,
        observer: &dyn StreamObserver,
    ) -> Result<StreamResult, ProviderError> {
        request.validate()?;

        let ticket = self.begin();
        let outcome = self.attempt(request, &ticket, observer).await;
        self.finish(&ticket, outcome.as_ref().err());

        outcome.map(DecodeOutcome::into_result)
    }

    /// Cancels the running stream, if any. The pending `start` resolves with `aborted: true`.
    pub fn abort(&self) {
        let token = lock(&self.active).token.take();
        if let Some(token) = token {
            token.cancel();
            lock(&self.snapshot).is_streaming = false;
            tracing::debug!(phase = "session", event = "abort", "stream cancelled");
        }
    }

    /// Clears streamed progress and the last error.
    pub fn reset(&self) {
        let mut snapshot = lock(&self.snapshot);
        snapshot.text.clear();
        snapshot.search_queries.clear();
        snapshot.citations.clear();
        snapshot.error = None;
    }

    pub fn clear_error(&self) {
        lock(&self.snapshot).error = None;
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        lock(&self.snapshot).clone()
    }

    pub fn is_streaming(&self) -> bool {
        lock(&self.snapshot).is_streaming
    }

    pub(crate) fn begin(&self) -> StreamTicket {
        let token = CancellationToken::new();
        let generation = {
            let mut active = lock(&self.active);
            if let Some(previous) = active.token.replace(token.clone()) {
                previous.cancel();
            }
            active.generation += 1;
            active.generation
        };

        *lock(&self.snapshot) = StreamSnapshot {
            is_streaming: true,
            ..StreamSnapshot::default()
        };

        StreamTicket { generation, token }
    }

    /// Runs one network attempt under `ticket`. Progress from an earlier attempt of the same
    /// ticket is discarded first.
    pub(crate) async fn attempt(
        &self,
        request: ChatRequest,
        ticket: &StreamTicket,
        observer: &dyn StreamObserver,
    ) -> Result<DecodeOutcome, ProviderError> {
        let aborted = || DecodeOutcome {
            accumulated: StreamAccumulator::new(),
            aborted: true,
        };

        if ticket.token.is_cancelled() {
            return Ok(aborted());
        }

        self.update_if_current(ticket.generation, |snapshot| {
            snapshot.text.clear();
            snapshot.search_queries.clear();
            snapshot.citations.clear();
        });

        let format = WireFormat::for_provider(request.provider);
        let chunks = tokio::select! {
            biased;
            _ = ticket.token.cancelled() => return Ok(aborted()),
            chunks = self.transport.stream(request) => chunks?,
        };

        let observer = SnapshotObserver {
            session: self,
            generation: ticket.generation,
            inner: observer,
        };

        decode_stream(format, chunks, &ticket.token, &observer).await
    }

    pub(crate) fn finish(&self, ticket: &StreamTicket, error: Option<&ProviderError>) {
        {
            let mut active = lock(&self.active);
            if active.generation != ticket.generation {
                return;
            }
            active.token = None;
        }

        let mut snapshot = lock(&self.snapshot);
        snapshot.is_streaming = false;
        snapshot.error = error.map(ToString::to_string);
    }

    fn update_if_current(&self, generation: u64, update: impl FnOnce(&mut StreamSnapshot)) {
        if lock(&self.active).generation != generation {
            return;
        }
        update(&mut lock(&self.snapshot));
    }
}

struct SnapshotObserver<'a> {
    session: &'a StreamSession,
    generation: u64,
    inner: &'a dyn StreamObserver,
}

impl StreamObserver for SnapshotObserver<'_> {
    fn on_text(&self, accumulated: &str) {
        self.session.update_if_current(self.generation, |snapshot| {
            snapshot.text.clear();
            snapshot.text.push_str(accumulated);
        });
        self.inner.on_text(accumulated);
    }

    fn on_search_query(&self, query: &SearchQuery) {
        self.session.update_if_current(self.generation, |snapshot| {
            snapshot.search_queries.push(query.clone());
        });
        self.inner.on_search_query(query);
    }

    fn on_citation(&self, citation: &Citation) {
        self.session.update_if_current(self.generation, |snapshot| {
            snapshot.citations.push(citation.clone());
        });
        self.inner.on_citation(citation);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
