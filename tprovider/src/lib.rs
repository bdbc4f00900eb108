//! Provider-facing core: wire decoders, stream sessions, and rate-limit fallback.
//!
//! ```rust
//! use tprovider::{ChatRequest, Message, ProviderId, StreamDecoder, WireFormat};
//!
//! let request = ChatRequest::builder(ProviderId::Claude, ProviderId::Claude.default_model())
//!     .message(Message::user("hello"))
//!     .api_key("sk-ant-example")
//!     .build_validated()
//!     .expect("request should validate");
//!
//! let mut decoder = StreamDecoder::new(WireFormat::for_provider(request.provider));
//! decoder.feed(
//!     b"data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
//! );
//! assert_eq!(decoder.finish().text, "Hi");
//! ```

pub mod adapters;
mod catalog;
mod credentials;
mod error;
mod fallback;
mod hooks;
mod model;
pub mod prelude;
mod session;
mod sse;
mod stream;
mod transport;

pub type ProviderFuture<'a, T> = tcommon::BoxFuture<'a, T>;

pub use adapters::{FrameDecoder, WireFormat};
pub use catalog::{ModelCatalog, ModelOption};
pub use credentials::{CredentialSource, SecretString, SecureCredentialManager};
pub use error::{ErrorBody, ProviderError, ProviderErrorKind, error_types};
pub use fallback::{FallbackChain, FallbackOrchestrator};
pub use hooks::{NoopStreamHooks, StreamHooks};
pub use model::{
    ChatRequest, ChatRequestBuilder, Citation, FallbackInfo, Message, ProviderId, Role,
    SearchQuery, StreamResult, WebSearchResult,
};
pub use session::{StreamSession, StreamSnapshot};
pub use sse::SseFrameBuffer;
pub use stream::{
    DecodeOutcome, DecodedEvent, NoopStreamObserver, StreamAccumulator, StreamDecoder,
    StreamObserver, decode_stream,
};
pub use tokio_util::sync::CancellationToken;
pub use transport::{ApiChatRequest, ByteStream, ChatTransport};

#[cfg(feature = "http-transport")]
pub use transport::{DEFAULT_BASE_URL, DEFAULT_CHAT_PATH, HttpChatTransport};
