//! Observability hooks for stream attempts, rate-limit fallbacks, and decoded stream events.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tobserve::{SafeStreamHooks, TracingObservabilityHooks};
//! use tprovider::FallbackOrchestrator;
//!
//! let orchestrator = FallbackOrchestrator::default()
//!     .with_hooks(Arc::new(SafeStreamHooks::new(TracingObservabilityHooks)));
//! assert_eq!(orchestrator.chain().providers().len(), 3);
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeStreamHooks, SafeStreamObserver};
pub use tracing_hooks::{TracingObservabilityHooks, TracingStreamObserver};

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeStreamHooks, SafeStreamObserver, TracingObservabilityHooks,
        TracingStreamObserver,
    };
}

#[cfg(test)]
mod tests;
