//! Common imports for most Tandem applications.

pub use crate::{
    ChatError, ChatErrorKind, ChatMessage, ChatOrchestrator, ChatSelection, ClientBundle,
    ClientConfig, CredentialSource, FallbackChain, FallbackInfo, Message, ProviderError,
    ProviderId, Role, SafeStreamHooks, SearchQuery, SecureCredentialManager, SessionId,
    StreamObserver, StreamResult, TracingObservabilityHooks,
};
pub use crate::{
    assistant_message, build_client, chat_orchestrator, credentials_from_env, parse_provider_id,
    user_message,
};
pub use crate::{tandem_messages, tandem_msg};
