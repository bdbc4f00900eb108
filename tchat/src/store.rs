//! Conversation storage contracts and a basic in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tcommon::{BoxFuture, SessionId};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::{ChatError, ChatMessage};

pub type ChatFuture<'a, T> = BoxFuture<'a, T>;

pub trait ConversationStore: Send + Sync {
    fn load_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Vec<ChatMessage>, ChatError>>;

    fn append_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
        messages: Vec<ChatMessage>,
    ) -> ChatFuture<'a, Result<(), ChatError>>;

    fn clear<'a>(&'a self, session_id: &'a SessionId) -> ChatFuture<'a, Result<(), ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    sessions: Mutex<HashMap<SessionId, Vec<ChatMessage>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn load_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> ChatFuture<'a, Result<Vec<ChatMessage>, ChatError>> {
        Box::pin(async move {
            let sessions = self
                .sessions
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            Ok(sessions.get(session_id).cloned().unwrap_or_default())
        })
    }

    fn append_messages<'a>(
        &'a self,
        session_id: &'a SessionId,
        messages: Vec<ChatMessage>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            sessions
                .entry(session_id.clone())
                .or_default()
                .extend(messages);

            Ok(())
        })
    }

    fn clear<'a>(&'a self, session_id: &'a SessionId) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.sessions
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?
                .remove(session_id);

            Ok(())
        })
    }
}

enum StoreCommand {
    Append(Vec<ChatMessage>),
    Clear,
    Load(oneshot::Sender<Result<Vec<ChatMessage>, ChatError>>),
}

/// Runs every store call for one session on a single worker task, in submission order.
///
/// Writes are fire-and-forget. The worker is spawned on the first call made inside a tokio
/// runtime and stops once the queue is dropped.
pub(crate) struct StoreQueue {
    store: Arc<dyn ConversationStore>,
    session_id: SessionId,
    sender: OnceLock<mpsc::UnboundedSender<StoreCommand>>,
}

impl StoreQueue {
    pub(crate) fn new(store: Arc<dyn ConversationStore>, session_id: SessionId) -> Self {
        Self {
            store,
            session_id,
            sender: OnceLock::new(),
        }
    }

    pub(crate) fn append(&self, messages: Vec<ChatMessage>) {
        self.submit(StoreCommand::Append(messages));
    }

    pub(crate) fn clear(&self) {
        self.submit(StoreCommand::Clear);
    }

    /// Loads the session once every previously submitted write has been applied.
    pub(crate) async fn load(&self) -> Result<Vec<ChatMessage>, ChatError> {
        let Some(sender) = self.sender() else {
            return self.store.load_messages(&self.session_id).await;
        };

        let (reply, response) = oneshot::channel();
        sender
            .send(StoreCommand::Load(reply))
            .map_err(|_| ChatError::store("conversation store worker stopped"))?;
        response
            .await
            .map_err(|_| ChatError::store("conversation store worker stopped"))?
    }

    fn submit(&self, command: StoreCommand) {
        let Some(sender) = self.sender() else {
            tracing::warn!(
                phase = "store",
                session = %self.session_id,
                "no async runtime; store write dropped"
            );
            return;
        };

        if sender.send(command).is_err() {
            tracing::warn!(
                phase = "store",
                session = %self.session_id,
                "store worker stopped; store write dropped"
            );
        }
    }

    fn sender(&self) -> Option<&mpsc::UnboundedSender<StoreCommand>> {
        if let Some(sender) = self.sender.get() {
            return Some(sender);
        }

        let handle = Handle::try_current().ok()?;
        Some(self.sender.get_or_init(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            handle.spawn(drain_store_commands(
                Arc::clone(&self.store),
                self.session_id.clone(),
                receiver,
            ));
            sender
        }))
    }
}

async fn drain_store_commands(
    store: Arc<dyn ConversationStore>,
    session_id: SessionId,
    mut receiver: mpsc::UnboundedReceiver<StoreCommand>,
) {
    while let Some(command) = receiver.recv().await {
        let outcome = match command {
            StoreCommand::Append(messages) => store.append_messages(&session_id, messages).await,
            StoreCommand::Clear => store.clear(&session_id).await,
            StoreCommand::Load(reply) => {
                let _ = reply.send(store.load_messages(&session_id).await);
                Ok(())
            }
        };

        if let Err(error) = outcome {
            tracing::warn!(
                phase = "store",
                session = %session_id,
                error = %error,
                "conversation store write failed"
            );
        }
    }
}
