//! Metrics-based hooks for fallback-orchestrated streaming.
//!
//! ```rust
//! use tobserve::MetricsObservabilityHooks;
//! use tprovider::StreamHooks;
//!
//! fn accepts_stream_hooks(_hooks: &dyn StreamHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_stream_hooks(&hooks);
//! ```

use tprovider::{ProviderError, ProviderId, StreamHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl StreamHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, _attempt: u32) {
        metrics::counter!(
            "tandem_stream_attempts_total",
            "provider" => provider.to_string()
        )
        .increment(1);
    }

    fn on_fallback(&self, from: ProviderId, to: ProviderId, _attempt: u32, error: &ProviderError) {
        metrics::counter!(
            "tandem_fallbacks_total",
            "from" => from.to_string(),
            "to" => to.to_string(),
            "error_type" => error.error_type.clone()
        )
        .increment(1);
    }

    fn on_success(&self, provider: ProviderId, attempts: u32) {
        metrics::counter!(
            "tandem_stream_success_total",
            "provider" => provider.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "tandem_stream_attempts_per_success",
            "provider" => provider.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, provider: ProviderId, _attempts: u32, error: &ProviderError) {
        metrics::counter!(
            "tandem_stream_failures_total",
            "provider" => provider.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_aborted(&self, provider: ProviderId, _attempts: u32) {
        metrics::counter!(
            "tandem_stream_aborted_total",
            "provider" => provider.to_string()
        )
        .increment(1);
    }
}
