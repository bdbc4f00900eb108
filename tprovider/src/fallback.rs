//! Rate-limit fallback across a fixed provider priority chain.
//!
//! ```rust
//! use std::collections::HashMap;
//! use tprovider::{FallbackChain, ProviderId};
//!
//! let chain = FallbackChain::default();
//! let mut keys = HashMap::new();
//! keys.insert(ProviderId::Claude, "sk-ant-x".to_string());
//!
//! // Groq has no key, so Gemini falls straight through to Claude.
//! assert_eq!(
//!     chain.next_candidate(ProviderId::Gemini, &[ProviderId::Gemini], &keys),
//!     Some(ProviderId::Claude)
//! );
//! assert_eq!(
//!     chain.next_candidate(ProviderId::Claude, &[ProviderId::Claude], &keys),
//!     None
//! );
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    ChatRequest, FallbackInfo, NoopStreamHooks, ProviderError, ProviderId, StreamHooks,
    StreamObserver, StreamResult, StreamSession,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    providers: Vec<ProviderId>,
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::new(vec![ProviderId::Gemini, ProviderId::Groq, ProviderId::Claude])
    }
}

impl FallbackChain {
    pub fn new(providers: Vec<ProviderId>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }

    pub fn contains(&self, provider: ProviderId) -> bool {
        self.providers.contains(&provider)
    }

    /// First chain member after `current` that is untried and has a non-empty key. A provider
    /// outside the chain scans from the start.
    pub fn next_candidate(
        &self,
        current: ProviderId,
        attempted: &[ProviderId],
        keys: &HashMap<ProviderId, String>,
    ) -> Option<ProviderId> {
        let start = self
            .providers
            .iter()
            .position(|provider| *provider == current)
            .map_or(0, |index| index + 1);

        self.providers[start..].iter().copied().find(|provider| {
            !attempted.contains(provider)
                && keys
                    .get(provider)
                    .is_some_and(|key| !key.trim().is_empty())
        })
    }

    /// First chain member with a usable key.
    pub fn first_available(&self, keys: &HashMap<ProviderId, String>) -> Option<ProviderId> {
        self.providers.iter().copied().find(|provider| {
            keys.get(provider)
                .is_some_and(|key| !key.trim().is_empty())
        })
    }
}

pub struct FallbackOrchestrator {
    chain: FallbackChain,
    hooks: Arc<dyn StreamHooks>,
}

impl FallbackOrchestrator {
    pub fn new(chain: FallbackChain) -> Self {
        Self {
            chain,
            hooks: Arc::new(NoopStreamHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn StreamHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Streams `request`, moving down the chain on rate-limit failures.
    ///
    /// A successful first attempt carries no [`FallbackInfo`]. Otherwise the info describes
    /// the last hop: the provider that was rate limited and the one that finally answered.
    /// Non rate-limit errors, and rate limits with nowhere left to go, are returned unaltered.
    pub async fn run(
        &self,
        session: &StreamSession,
        request: ChatRequest,
        observer: &dyn StreamObserver,
    ) -> Result<StreamResult, ProviderError> {
        request.validate()?;

        let ticket = session.begin();
        let mut attempted = Vec::with_capacity(self.chain.providers().len());
        let mut current = request;
        let mut fallback_info = None;

        loop {
            let provider = current.provider;
            attempted.push(provider);
            let attempt = attempted.len() as u32;

            self.hooks.on_attempt_start(provider, attempt);
            tracing::debug!(
                phase = "fallback",
                event = "attempt_start",
                provider = %provider,
                model = %current.model,
                attempt,
                "starting stream attempt"
            );

            match session.attempt(current.clone(), &ticket, observer).await {
                Ok(outcome) if outcome.aborted => {
                    session.finish(&ticket, None);
                    self.hooks.on_aborted(provider, attempt);
                    tracing::info!(
                        phase = "fallback",
                        event = "aborted",
                        provider = %provider,
                        attempt,
                        "stream aborted"
                    );

                    return Ok(outcome.into_result());
                }
                Ok(outcome) => {
                    session.finish(&ticket, None);
                    self.hooks.on_success(provider, attempt);

                    let mut result = outcome.into_result();
                    result.fallback_info = fallback_info;
                    return Ok(result);
                }
                Err(error) => {
                    let next = if current.allow_fallback && error.is_rate_limit() {
                        self.chain
                            .next_candidate(provider, &attempted, &current.fallback_api_keys)
                    } else {
                        None
                    };

                    let Some(next) = next else {
                        session.finish(&ticket, Some(&error));
                        self.hooks.on_failure(provider, attempt, &error);
                        return Err(error);
                    };

                    self.hooks.on_fallback(provider, next, attempt, &error);
                    tracing::info!(
                        phase = "fallback",
                        event = "fallback",
                        from = %provider,
                        to = %next,
                        error_type = %error.error_type,
                        attempt,
                        "rate limited, falling back"
                    );

                    let key = current
                        .fallback_api_keys
                        .get(&next)
                        .cloned()
                        .unwrap_or_default();
                    current = current.fallback_to(next, key);
                    fallback_info = Some(FallbackInfo::rate_limited(provider, next));
                }
            }
        }
    }
}

impl Default for FallbackOrchestrator {
    fn default() -> Self {
        Self::new(FallbackChain::default())
    }
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(providers: &[ProviderId]) -> HashMap<ProviderId, String> {
        providers
            .iter()
            .map(|provider| (*provider, format!("{}test", provider.key_prefix())))
            .collect()
    }

    #[test]
    fn next_candidate_scans_downstream_only() {
        let chain = FallbackChain::default();
        let all = keys(&ProviderId::ALL);

        assert_eq!(
            chain.next_candidate(ProviderId::Gemini, &[ProviderId::Gemini], &all),
            Some(ProviderId::Groq)
        );
        assert_eq!(
            chain.next_candidate(ProviderId::Groq, &[ProviderId::Groq], &all),
            Some(ProviderId::Claude)
        );
        assert_eq!(
            chain.next_candidate(ProviderId::Claude, &[ProviderId::Claude], &all),
            None
        );
    }

    #[test]
    fn next_candidate_skips_attempted_and_keyless_members() {
        let chain = FallbackChain::new(vec![
            ProviderId::Gemini,
            ProviderId::Groq,
            ProviderId::Gemini,
            ProviderId::Claude,
        ]);
        let mut available = keys(&[ProviderId::Gemini, ProviderId::Claude]);
        available.insert(ProviderId::Groq, "  ".to_string());

        assert_eq!(
            chain.next_candidate(ProviderId::Gemini, &[ProviderId::Gemini], &available),
            Some(ProviderId::Claude)
        );
    }

    #[test]
    fn providers_outside_the_chain_scan_from_the_start() {
        let chain = FallbackChain::new(vec![ProviderId::Groq, ProviderId::Claude]);
        let available = keys(&ProviderId::ALL);

        assert_eq!(
            chain.next_candidate(ProviderId::Gemini, &[ProviderId::Gemini], &available),
            Some(ProviderId::Groq)
        );
        assert_eq!(chain.first_available(&available), Some(ProviderId::Groq));
        assert_eq!(chain.first_available(&HashMap::new()), None);
    }
}
