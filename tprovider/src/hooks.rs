//! Operational hook contract for fallback-orchestrated streaming.

use crate::{ProviderError, ProviderId};

/// Lifecycle callbacks for one orchestrated send. `attempt` counts from 1 across providers.
pub trait StreamHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _attempt: u32) {}

    fn on_fallback(
        &self,
        _from: ProviderId,
        _to: ProviderId,
        _attempt: u32,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _attempts: u32) {}

    fn on_failure(&self, _provider: ProviderId, _attempts: u32, _error: &ProviderError) {}

    fn on_aborted(&self, _provider: ProviderId, _attempts: u32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStreamHooks;

impl StreamHooks for NoopStreamHooks {}
