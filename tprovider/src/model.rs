//! Provider-agnostic request and streaming result model types.
//!
//! ```rust
//! use tprovider::{ChatRequest, Message, ProviderErrorKind, ProviderId};
//!
//! let ok = ChatRequest::builder(ProviderId::Gemini, "gemini-2.5-flash")
//!     .message(Message::user("What is the weather?"))
//!     .web_search_enabled(true)
//!     .api_key("AIzaSy-test")
//!     .build();
//! assert!(ok.validate().is_ok());
//!
//! let err = ChatRequest::builder(ProviderId::Groq, "gemini-2.5-flash")
//!     .message(Message::user("hi"))
//!     .build()
//!     .validate()
//!     .err()
//!     .expect("model from another provider should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    Gemini,
    Groq,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [Self::Claude, Self::Gemini, Self::Groq];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchResult {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_age: Option<String>,
}

impl WebSearchResult {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            page_age: None,
        }
    }

    pub fn with_page_age(mut self, page_age: impl Into<String>) -> Self {
        self.page_age = Some(page_age.into());
        self
    }
}

/// A search the model ran, together with the results it got back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub results: Vec<WebSearchResult>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, results: Vec<WebSearchResult>) -> Self {
        Self {
            query: query.into(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    pub cited_text: String,
}

impl Citation {
    pub const WEB_SEARCH_RESULT_LOCATION: &'static str = "web_search_result_location";

    pub fn web_search_result_location(
        url: impl Into<String>,
        title: impl Into<String>,
        cited_text: impl Into<String>,
    ) -> Self {
        Self {
            kind: Self::WEB_SEARCH_RESULT_LOCATION.to_string(),
            url: url.into(),
            title: title.into(),
            cited_text: cited_text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackInfo {
    pub occurred: bool,
    pub from_provider: ProviderId,
    pub to_provider: ProviderId,
    pub reason: String,
}

impl FallbackInfo {
    pub const RATE_LIMIT_REASON: &'static str = "rate limit exceeded";

    pub fn rate_limited(from_provider: ProviderId, to_provider: ProviderId) -> Self {
        Self {
            occurred: true,
            from_provider,
            to_provider,
            reason: Self::RATE_LIMIT_REASON.to_string(),
        }
    }
}

/// Outcome of one streamed exchange, successful or cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamResult {
    pub text: String,
    pub search_queries: Vec<SearchQuery>,
    pub citations: Vec<Citation>,
    pub aborted: bool,
    pub fallback_info: Option<FallbackInfo>,
}

impl StreamResult {
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
    pub provider: ProviderId,
    pub web_search_enabled: bool,
    pub api_key: Option<String>,
    pub fallback_api_keys: HashMap<ProviderId, String>,
    pub allow_fallback: bool,
}

impl ChatRequest {
    pub fn new(provider: ProviderId, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: model.into(),
            provider,
            web_search_enabled: false,
            api_key: None,
            fallback_api_keys: HashMap::new(),
            allow_fallback: false,
        }
    }

    pub fn builder(provider: ProviderId, model: impl Into<String>) -> ChatRequestBuilder {
        ChatRequestBuilder::new(provider, model)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if !self.provider.has_model(&self.model) {
            return Err(ProviderError::invalid_request(format!(
                "model '{}' is not offered by provider '{}'",
                self.model, self.provider
            )));
        }

        Ok(())
    }

    /// Rewrites the request for another provider: its default model, the given key, and web
    /// search switched off where the provider cannot search.
    pub fn fallback_to(&self, provider: ProviderId, api_key: impl Into<String>) -> Self {
        Self {
            messages: self.messages.clone(),
            model: provider.default_model().to_string(),
            provider,
            web_search_enabled: self.web_search_enabled && provider.supports_web_search(),
            api_key: Some(api_key.into()),
            fallback_api_keys: self.fallback_api_keys.clone(),
            allow_fallback: self.allow_fallback,
        }
    }

    /// Key for `provider`: the primary key for the request's own provider, otherwise the
    /// matching fallback key. Empty keys count as absent.
    pub fn credential_for(&self, provider: ProviderId) -> Option<&str> {
        let key = if provider == self.provider {
            self.api_key
                .as_deref()
                .or_else(|| self.fallback_api_keys.get(&provider).map(String::as_str))
        } else {
            self.fallback_api_keys.get(&provider).map(String::as_str)
        };

        key.filter(|key| !key.trim().is_empty())
    }
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fallback_providers = self.fallback_api_keys.keys().collect::<Vec<_>>();

        f.debug_struct("ChatRequest")
            .field("messages", &self.messages)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("web_search_enabled", &self.web_search_enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("fallback_api_keys", &fallback_providers)
            .field("allow_fallback", &self.allow_fallback)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequestBuilder {
    request: ChatRequest,
}

impl ChatRequestBuilder {
    pub fn new(provider: ProviderId, model: impl Into<String>) -> Self {
        Self {
            request: ChatRequest::new(provider, model, Vec::new()),
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.request.messages.extend(messages);
        self
    }

    pub fn web_search_enabled(mut self, enabled: bool) -> Self {
        self.request.web_search_enabled = enabled;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.request.api_key = Some(api_key.into());
        self
    }

    pub fn fallback_api_key(mut self, provider: ProviderId, api_key: impl Into<String>) -> Self {
        self.request
            .fallback_api_keys
            .insert(provider, api_key.into());
        self
    }

    pub fn fallback_api_keys(mut self, keys: HashMap<ProviderId, String>) -> Self {
        self.request.fallback_api_keys = keys;
        self
    }

    pub fn allow_fallback(mut self, allow: bool) -> Self {
        self.request.allow_fallback = allow;
        self
    }

    pub fn build(self) -> ChatRequest {
        self.request
    }

    pub fn build_validated(self) -> Result<ChatRequest, ProviderError> {
        self.request.validate()?;
        Ok(self.request)
    }
}
