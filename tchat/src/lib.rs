//! Conversational orchestration over streaming providers.
//!
//! A [`ChatOrchestrator`] owns committed history and the active provider/model selection. Each
//! send streams through a [`tprovider::FallbackOrchestrator`], so a rate-limited provider can
//! hand the turn to the next keyed provider in the chain without the caller noticing.
//!
//! ```rust
//! use tchat::{ChatMessage, session_title};
//!
//! let history = vec![ChatMessage::user("What is the weather in Seoul today?")];
//! assert_eq!(session_title(&history), "What is the weather in Seoul t...");
//! ```

mod error;
mod orchestrator;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatMessage, ChatOrchestrator, ChatOrchestratorBuilder,
        ChatSelection, ConversationStore, InMemoryConversationStore, session_title,
    };
    pub use tcommon::SessionId;
}

pub use error::{ChatError, ChatErrorKind};
pub use orchestrator::{ChatOrchestrator, ChatOrchestratorBuilder};
pub use store::{ChatFuture, ConversationStore, InMemoryConversationStore};
pub use types::{ChatMessage, ChatSelection, DEFAULT_SESSION_TITLE, session_title};
pub use tcommon::SessionId;
