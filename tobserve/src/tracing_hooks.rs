//! Tracing-based hooks for fallback attempts and decoded stream events.
//!
//! ```rust
//! use tobserve::TracingObservabilityHooks;
//! use tprovider::StreamHooks;
//!
//! fn accepts_stream_hooks(_hooks: &dyn StreamHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_stream_hooks(&hooks);
//! ```

use tprovider::{Citation, ProviderError, ProviderId, SearchQuery, StreamHooks, StreamObserver};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl StreamHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, attempt: u32) {
        tracing::info!(
            phase = "stream",
            event = "attempt_start",
            provider = %provider,
            attempt
        );
    }

    fn on_fallback(&self, from: ProviderId, to: ProviderId, attempt: u32, error: &ProviderError) {
        tracing::warn!(
            phase = "stream",
            event = "fallback",
            from = %from,
            to = %to,
            attempt,
            error_kind = ?error.kind,
            error_type = %error.error_type,
            status = error.status,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, attempts: u32) {
        tracing::info!(
            phase = "stream",
            event = "success",
            provider = %provider,
            attempts
        );
    }

    fn on_failure(&self, provider: ProviderId, attempts: u32, error: &ProviderError) {
        tracing::error!(
            phase = "stream",
            event = "failure",
            provider = %provider,
            attempts,
            error_kind = ?error.kind,
            error_type = %error.error_type,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_aborted(&self, provider: ProviderId, attempts: u32) {
        tracing::info!(
            phase = "stream",
            event = "aborted",
            provider = %provider,
            attempts
        );
    }
}

/// Logs decoded events as they arrive. Text is reported by length only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStreamObserver;

impl StreamObserver for TracingStreamObserver {
    fn on_text(&self, accumulated: &str) {
        tracing::trace!(
            phase = "decode",
            event = "text",
            chars = accumulated.chars().count()
        );
    }

    fn on_search_query(&self, query: &SearchQuery) {
        tracing::debug!(
            phase = "decode",
            event = "search_query",
            query = %query.query,
            results = query.results.len()
        );
    }

    fn on_citation(&self, citation: &Citation) {
        tracing::debug!(
            phase = "decode",
            event = "citation",
            url = %citation.url,
            title = %citation.title
        );
    }
}
