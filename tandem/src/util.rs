//! Small convenience constructors for common types.

use crate::{Message, ProviderError, ProviderId, Role, SecureCredentialManager};

pub fn user_message(content: impl Into<String>) -> Message {
    Message::new(Role::User, content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::new(Role::Assistant, content)
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "claude" | "anthropic" => Some(ProviderId::Claude),
        "gemini" | "google" => Some(ProviderId::Gemini),
        "groq" => Some(ProviderId::Groq),
        _ => None,
    }
}

/// Environment variable consulted by [`credentials_from_env`] for `provider`.
pub fn api_key_env_var(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Claude => "ANTHROPIC_API_KEY",
        ProviderId::Gemini => "GEMINI_API_KEY",
        ProviderId::Groq => "GROQ_API_KEY",
    }
}

/// Loads every provider key present in the environment. Unset or blank variables are skipped;
/// a set key with the wrong prefix is an error.
pub fn credentials_from_env() -> Result<SecureCredentialManager, ProviderError> {
    credentials_from_lookup(|name| std::env::var(name).ok())
}

pub(crate) fn credentials_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecureCredentialManager, ProviderError> {
    let credentials = SecureCredentialManager::new();
    for provider in ProviderId::ALL {
        let Some(api_key) = lookup(api_key_env_var(provider)) else {
            continue;
        };
        if api_key.trim().is_empty() {
            continue;
        }
        credentials.set_api_key(provider, api_key)?;
    }

    Ok(credentials)
}
