//! Unified facade over the Tandem workspace crates.
//!
//! Most applications only need this crate: it re-exports the provider core, the chat
//! orchestrator and the observability hooks, and wires them to an HTTP chat backend.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tandem::{ClientConfig, ProviderId, build_client, chat_orchestrator, credentials_from_env};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = build_client(ClientConfig::from_env()?)?;
//! let credentials = Arc::new(credentials_from_env()?);
//! let chat = chat_orchestrator(&client, credentials, ProviderId::Gemini);
//!
//! chat.send_message("What's new in Rust?").await?;
//! if let Some(info) = chat.fallback_info() {
//!     println!("answered by {} after {}", info.to_provider, info.reason);
//! }
//! # Ok(())
//! # }
//! ```

mod macros;

pub mod client;
pub mod prelude;
pub mod util;

pub use tchat;
pub use tcommon;
pub use tobserve;
pub use tprovider;

pub use tchat::{
    ChatError, ChatErrorKind, ChatMessage, ChatOrchestrator, ChatOrchestratorBuilder,
    ChatSelection, ConversationStore, DEFAULT_SESSION_TITLE, InMemoryConversationStore,
    session_title,
};
pub use tcommon::{BoxFuture, SessionId};
pub use tobserve::{
    MetricsObservabilityHooks, SafeStreamHooks, SafeStreamObserver, TracingObservabilityHooks,
    TracingStreamObserver,
};
pub use tprovider::{
    ByteStream, CancellationToken, ChatRequest, ChatRequestBuilder, ChatTransport, Citation,
    CredentialSource, DEFAULT_BASE_URL, DEFAULT_CHAT_PATH, ErrorBody, FallbackChain,
    FallbackInfo, FallbackOrchestrator, HttpChatTransport, Message, ModelCatalog, ModelOption,
    NoopStreamHooks, NoopStreamObserver, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderId, Role, SearchQuery, SecretString, SecureCredentialManager, StreamDecoder,
    StreamHooks, StreamObserver, StreamResult, StreamSession, StreamSnapshot, WebSearchResult,
    WireFormat, error_types,
};

pub use client::{
    ClientBundle, ClientConfig, build_client, build_client_with_hooks, build_transport,
    chat_orchestrator, client_with_transport,
};
pub use util::{
    api_key_env_var, assistant_message, credentials_from_env, parse_provider_id, user_message,
};
