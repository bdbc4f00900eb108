//! Committed chat messages, the active provider selection, and session titles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tprovider::{Citation, Message, ProviderId, Role, SearchQuery, StreamResult};
use uuid::Uuid;

pub const DEFAULT_SESSION_TITLE: &str = "New chat";
const TITLE_CHAR_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_queries: Option<Vec<SearchQuery>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4().simple()),
            role,
            content: content.into(),
            created_at: Utc::now(),
            search_queries: None,
            citations: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Builds the committed assistant turn. Empty query and citation lists are left unset.
    pub fn assistant(result: &StreamResult) -> Self {
        let mut message = Self::new(Role::Assistant, result.text.clone());
        if !result.search_queries.is_empty() {
            message.search_queries = Some(result.search_queries.clone());
        }
        if !result.citations.is_empty() {
            message.citations = Some(result.citations.clone());
        }
        message
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSelection {
    pub provider: ProviderId,
    pub model: String,
    pub web_search_enabled: bool,
}

impl ChatSelection {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            web_search_enabled: false,
        }
    }

    /// Web search as it should be sent: always off for providers that cannot search.
    pub fn effective_web_search(&self) -> bool {
        self.web_search_enabled && self.provider.supports_web_search()
    }
}

/// Title derived from the first user message: newlines folded, cut at 30 characters.
pub fn session_title(messages: &[ChatMessage]) -> String {
    let Some(first) = messages.iter().find(|message| message.role == Role::User) else {
        return DEFAULT_SESSION_TITLE.to_string();
    };

    let folded = first.content.trim().replace('\n', " ");
    if folded.chars().count() <= TITLE_CHAR_LIMIT {
        return folded;
    }

    let mut title = folded.chars().take(TITLE_CHAR_LIMIT).collect::<String>();
    title.push_str("...");
    title
}
