//! Client configuration and wiring for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::{
    ChatOrchestrator, ChatTransport, CredentialSource, DEFAULT_BASE_URL, DEFAULT_CHAT_PATH,
    FallbackChain, FallbackOrchestrator, HttpChatTransport, ProviderError, ProviderId,
    SafeStreamHooks, StreamHooks, StreamSession, TracingObservabilityHooks, parse_provider_id,
};

pub const BASE_URL_ENV: &str = "TANDEM_BASE_URL";
pub const CHAT_PATH_ENV: &str = "TANDEM_CHAT_PATH";
pub const TIMEOUT_ENV: &str = "TANDEM_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_ENV: &str = "TANDEM_CONNECT_TIMEOUT_SECS";
pub const FALLBACK_CHAIN_ENV: &str = "TANDEM_FALLBACK_CHAIN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub chat_path: String,
    pub connect_timeout: Duration,
    /// Longest silence tolerated between two body reads. A stream may run for any total
    /// length as long as chunks keep arriving.
    pub read_timeout: Duration,
    pub fallback_chain: FallbackChain,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(90),
            fallback_chain: FallbackChain::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Defaults overridden by `TANDEM_BASE_URL`, `TANDEM_CHAT_PATH`, `TANDEM_TIMEOUT_SECS`
    /// (read timeout), `TANDEM_CONNECT_TIMEOUT_SECS` and `TANDEM_FALLBACK_CHAIN`
    /// (comma-separated provider names).
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProviderError> {
        let mut config = Self::default();
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = lookup(BASE_URL_ENV) {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(chat_path) = lookup(CHAT_PATH_ENV) {
            config.chat_path = chat_path.trim().to_string();
        }

        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config.read_timeout = parse_seconds(TIMEOUT_ENV, &timeout)?;
        }

        if let Some(timeout) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = parse_seconds(CONNECT_TIMEOUT_ENV, &timeout)?;
        }

        if let Some(chain) = lookup(FALLBACK_CHAIN_ENV) {
            let providers = chain
                .split(',')
                .map(|name| {
                    parse_provider_id(name).ok_or_else(|| {
                        ProviderError::invalid_request(format!(
                            "{FALLBACK_CHAIN_ENV} names unknown provider '{}'",
                            name.trim()
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            config.fallback_chain = FallbackChain::new(providers);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_chat_path(mut self, chat_path: impl Into<String>) -> Self {
        self.chat_path = chat_path.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_fallback_chain(mut self, fallback_chain: FallbackChain) -> Self {
        self.fallback_chain = fallback_chain;
        self
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration, ProviderError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| {
            ProviderError::invalid_request(format!(
                "{name} must be a whole number of seconds, got '{value}'"
            ))
        })
}

/// Shared pieces every chat on one backend uses.
#[derive(Debug, Clone)]
pub struct ClientBundle {
    pub session: Arc<StreamSession>,
    pub fallback: Arc<FallbackOrchestrator>,
}

pub fn build_transport(config: &ClientConfig) -> Result<Arc<dyn ChatTransport>, ProviderError> {
    let http = Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    Ok(Arc::new(
        HttpChatTransport::new(http)
            .with_base_url(config.base_url.clone())
            .with_chat_path(config.chat_path.clone()),
    ))
}

/// Builds an HTTP-backed client with panic-isolated tracing hooks on the fallback loop.
pub fn build_client(config: ClientConfig) -> Result<ClientBundle, ProviderError> {
    build_client_with_hooks(config, Arc::new(SafeStreamHooks::new(TracingObservabilityHooks)))
}

pub fn build_client_with_hooks(
    config: ClientConfig,
    hooks: Arc<dyn StreamHooks>,
) -> Result<ClientBundle, ProviderError> {
    let transport = build_transport(&config)?;
    Ok(client_with_transport(transport, config.fallback_chain, hooks))
}

pub fn client_with_transport(
    transport: Arc<dyn ChatTransport>,
    fallback_chain: FallbackChain,
    hooks: Arc<dyn StreamHooks>,
) -> ClientBundle {
    ClientBundle {
        session: Arc::new(StreamSession::new(transport)),
        fallback: Arc::new(FallbackOrchestrator::new(fallback_chain).with_hooks(hooks)),
    }
}

pub fn chat_orchestrator(
    client: &ClientBundle,
    credentials: Arc<dyn CredentialSource>,
    provider: ProviderId,
) -> ChatOrchestrator {
    ChatOrchestrator::builder(Arc::clone(&client.session), credentials)
        .fallback(Arc::clone(&client.fallback))
        .provider(provider)
        .build()
}
