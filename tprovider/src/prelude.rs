//! Common `tprovider` imports for downstream crates.

pub use crate::{
    ChatRequest, ChatTransport, Citation, CredentialSource, FallbackChain, FallbackInfo,
    FallbackOrchestrator, Message, ModelCatalog, ProviderError, ProviderErrorKind, ProviderId,
    Role, SearchQuery, SecureCredentialManager, StreamHooks, StreamObserver, StreamResult,
    StreamSession, WebSearchResult,
};
pub use tcommon::BoxFuture;
