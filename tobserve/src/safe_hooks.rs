use std::panic::{AssertUnwindSafe, catch_unwind};

use tprovider::{Citation, ProviderError, ProviderId, SearchQuery, StreamHooks, StreamObserver};

/// Wraps hooks so a panicking callback never unwinds into the fallback loop.
pub struct SafeStreamHooks<H> {
    inner: H,
}

impl<H> SafeStreamHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> StreamHooks for SafeStreamHooks<H>
where
    H: StreamHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, attempt)
        }));
    }

    fn on_fallback(&self, from: ProviderId, to: ProviderId, attempt: u32, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_fallback(from, to, attempt, error)
        }));
    }

    fn on_success(&self, provider: ProviderId, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, attempts)
        }));
    }

    fn on_failure(&self, provider: ProviderId, attempts: u32, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, attempts, error)
        }));
    }

    fn on_aborted(&self, provider: ProviderId, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_aborted(provider, attempts)
        }));
    }
}

pub struct SafeStreamObserver<O> {
    inner: O,
}

impl<O> SafeStreamObserver<O> {
    pub fn new(inner: O) -> Self {
        Self { inner }
    }
}

impl<O> StreamObserver for SafeStreamObserver<O>
where
    O: StreamObserver,
{
    fn on_text(&self, accumulated: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_text(accumulated)));
    }

    fn on_search_query(&self, query: &SearchQuery) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_search_query(query)));
    }

    fn on_citation(&self, citation: &Citation) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_citation(citation)));
    }
}
