//! Chat Orchestrator: conversation history, provider selection, and per-turn streaming.
//!
//! The orchestrator is the only writer of committed history. Each `send_message` appends the
//! user turn, runs one fallback-orchestrated stream, then either commits the assistant reply
//! or, when the stream was aborted, retracts the user turn again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tcommon::SessionId;
use tprovider::{
    ChatRequest, CredentialSource, FallbackInfo, FallbackOrchestrator, ModelCatalog,
    NoopStreamObserver, ProviderError, ProviderId, StreamObserver, StreamSession, StreamSnapshot,
};

use crate::store::StoreQueue;
use crate::{ChatError, ChatMessage, ChatSelection, ConversationStore, session_title};

#[derive(Debug)]
struct ChatState {
    messages: Vec<ChatMessage>,
    selection: ChatSelection,
    fallback_info: Option<FallbackInfo>,
    last_error: Option<String>,
}

pub struct ChatOrchestrator {
    session_id: SessionId,
    stream: Arc<StreamSession>,
    fallback: Arc<FallbackOrchestrator>,
    credentials: Arc<dyn CredentialSource>,
    store: Option<StoreQueue>,
    state: Mutex<ChatState>,
    in_flight: AtomicBool,
}

impl ChatOrchestrator {
    pub fn builder(
        stream: Arc<StreamSession>,
        credentials: Arc<dyn CredentialSource>,
    ) -> ChatOrchestratorBuilder {
        ChatOrchestratorBuilder::new(stream, credentials)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Sends one user turn. Returns `Ok(true)` when the stream was aborted.
    pub async fn send_message(&self, text: &str) -> Result<bool, ChatError> {
        self.send_message_with_observer(text, &NoopStreamObserver)
            .await
    }

    pub async fn send_message_with_observer(
        &self,
        text: &str,
        observer: &dyn StreamObserver,
    ) -> Result<bool, ChatError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ChatError::invalid_request("message must not be empty"));
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            return Err(ChatError::busy());
        };

        let (request, user_message) = self.prepare_turn(content)?;
        let provider = request.provider;
        tracing::debug!(
            phase = "chat",
            event = "send",
            session = %self.session_id,
            provider = %provider,
            model = %request.model,
            allow_fallback = request.allow_fallback,
            "sending chat turn"
        );

        self.stream.reset();
        match self.fallback.run(&self.stream, request, observer).await {
            Ok(result) if result.aborted => {
                self.state()
                    .messages
                    .retain(|message| message.id != user_message.id);
                tracing::debug!(phase = "chat", event = "aborted", "user turn retracted");
                Ok(true)
            }
            Ok(result) => {
                let assistant = ChatMessage::assistant(&result);
                {
                    let mut state = self.state();
                    if let Some(info) = result.fallback_info.filter(|info| info.occurred) {
                        tracing::info!(
                            phase = "chat",
                            event = "fallback",
                            from = %info.from_provider,
                            to = %info.to_provider,
                            "switching selection after fallback"
                        );
                        let web_search_enabled = state.selection.web_search_enabled
                            && info.to_provider.supports_web_search();
                        state.selection = ChatSelection {
                            web_search_enabled,
                            ..ChatSelection::new(info.to_provider)
                        };
                        state.fallback_info = Some(info);
                    }
                    state.messages.push(assistant.clone());
                }

                self.persist(vec![user_message, assistant]);
                Ok(false)
            }
            Err(error) => {
                let error = ChatError::from(error);
                self.state().last_error = Some(error.message.clone());
                self.persist(vec![user_message]);
                Err(error)
            }
        }
    }

    /// Appends the user turn and builds the request from the current selection and a fresh
    /// credential snapshot.
    fn prepare_turn(&self, content: &str) -> Result<(ChatRequest, ChatMessage), ChatError> {
        let keys = self.credentials.snapshot();
        let mut state = self.state();
        let selection = state.selection.clone();

        let Some(api_key) = keys.get(&selection.provider).cloned() else {
            let error = ChatError::from(ProviderError::missing_credential(format!(
                "no api key configured for {}",
                selection.provider
            )));
            state.last_error = Some(error.message.clone());
            return Err(error);
        };

        let user_message = ChatMessage::user(content);
        state.messages.push(user_message.clone());
        state.fallback_info = None;
        state.last_error = None;

        let allow_fallback = keys.keys().any(|provider| *provider != selection.provider);
        let request = ChatRequest::builder(selection.provider, selection.model.clone())
            .messages(state.messages.iter().map(ChatMessage::to_message))
            .web_search_enabled(selection.effective_web_search())
            .api_key(api_key)
            .fallback_api_keys(keys)
            .allow_fallback(allow_fallback)
            .build();

        Ok((request, user_message))
    }

    pub fn stop_generation(&self) {
        self.stream.abort();
    }

    pub fn clear_messages(&self) {
        self.state().messages.clear();
        self.stream.reset();

        if let Some(store) = self.store.as_ref() {
            store.clear();
        }
    }

    /// Replaces in-memory history with what the store holds for this session, once every
    /// earlier store write from this orchestrator has landed.
    pub async fn resume(&self) -> Result<usize, ChatError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(0);
        };

        let messages = store.load().await?;
        let count = messages.len();
        self.state().messages = messages;
        Ok(count)
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state().messages.clone()
    }

    pub fn title(&self) -> String {
        session_title(&self.state().messages)
    }

    pub fn selection(&self) -> ChatSelection {
        self.state().selection.clone()
    }

    pub fn set_provider(&self, provider: ProviderId) {
        let mut state = self.state();
        let web_search_enabled = state.selection.web_search_enabled;
        state.selection = ChatSelection {
            web_search_enabled,
            ..ChatSelection::new(provider)
        };
    }

    /// Selects `model`, switching provider to the one that offers it.
    pub fn set_model(&self, model: &str) -> Result<(), ChatError> {
        let provider = ModelCatalog::provider_for_model(model)
            .ok_or_else(|| ChatError::invalid_request(format!("unknown model '{model}'")))?;

        let mut state = self.state();
        state.selection.provider = provider;
        state.selection.model = model.to_string();
        Ok(())
    }

    pub fn set_web_search_enabled(&self, enabled: bool) {
        self.state().selection.web_search_enabled = enabled;
    }

    pub fn fallback_info(&self) -> Option<FallbackInfo> {
        self.state().fallback_info.clone()
    }

    pub fn clear_fallback_info(&self) {
        self.state().fallback_info = None;
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.state().last_error = None;
        self.stream.clear_error();
    }

    pub fn streaming_snapshot(&self) -> StreamSnapshot {
        self.stream.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn persist(&self, messages: Vec<ChatMessage>) {
        if let Some(store) = self.store.as_ref() {
            store.append(messages);
        }
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("session_id", &self.session_id)
            .field("selection", &self.state().selection)
            .field("in_flight", &self.is_loading())
            .finish_non_exhaustive()
    }
}

struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ChatOrchestratorBuilder {
    stream: Arc<StreamSession>,
    credentials: Arc<dyn CredentialSource>,
    fallback: Option<Arc<FallbackOrchestrator>>,
    store: Option<Arc<dyn ConversationStore>>,
    provider: Option<ProviderId>,
    session_id: Option<SessionId>,
}

impl ChatOrchestratorBuilder {
    pub fn new(stream: Arc<StreamSession>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            stream,
            credentials,
            fallback: None,
            store: None,
            provider: None,
            session_id: None,
        }
    }

    pub fn fallback(mut self, fallback: Arc<FallbackOrchestrator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Without an explicit provider the head of the fallback chain is selected.
    pub fn build(self) -> ChatOrchestrator {
        let fallback = self
            .fallback
            .unwrap_or_else(|| Arc::new(FallbackOrchestrator::default()));
        let provider = self
            .provider
            .or_else(|| fallback.chain().providers().first().copied())
            .unwrap_or(ProviderId::Claude);

        let session_id = self.session_id.unwrap_or_else(SessionId::generate);
        let store = self
            .store
            .map(|store| StoreQueue::new(store, session_id.clone()));

        ChatOrchestrator {
            session_id,
            stream: self.stream,
            fallback,
            credentials: self.credentials,
            store,
            state: Mutex::new(ChatState {
                messages: Vec::new(),
                selection: ChatSelection::new(provider),
                fallback_info: None,
                last_error: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }
}
