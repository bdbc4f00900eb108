//! In-memory API key storage and the read-only accessor the chat core samples per send.
//!
//! ```rust
//! use tprovider::{CredentialSource, ProviderId, SecureCredentialManager};
//!
//! let manager = SecureCredentialManager::new();
//! manager.set_api_key(ProviderId::Groq, "gsk_live").expect("valid key");
//! assert!(manager.set_api_key(ProviderId::Claude, "gsk_wrong").is_err());
//!
//! assert_eq!(manager.credential(ProviderId::Groq).as_deref(), Some("gsk_live"));
//! assert_eq!(manager.snapshot().len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{ProviderError, ProviderId};

#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

/// Read-only view over stored credentials.
pub trait CredentialSource: Send + Sync {
    fn credential(&self, provider: ProviderId) -> Option<String>;

    /// Every non-empty credential, keyed by provider.
    fn snapshot(&self) -> HashMap<ProviderId, String> {
        ProviderId::ALL
            .into_iter()
            .filter_map(|provider| {
                self.credential(provider)
                    .filter(|key| !key.trim().is_empty())
                    .map(|key| (provider, key))
            })
            .collect()
    }
}

impl CredentialSource for HashMap<ProviderId, String> {
    fn credential(&self, provider: ProviderId) -> Option<String> {
        self.get(&provider).cloned()
    }
}

#[derive(Default)]
pub struct SecureCredentialManager {
    credentials: Mutex<HashMap<ProviderId, SecretString>>,
}

impl SecureCredentialManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a key after checking it is non-empty and carries the provider's prefix.
    pub fn set_api_key(
        &self,
        provider: ProviderId,
        api_key: impl Into<String>,
    ) -> Result<(), ProviderError> {
        let api_key = SecretString::new(api_key.into().trim());
        if api_key.is_empty() {
            return Err(ProviderError::invalid_credential("api key must not be empty"));
        }

        if !api_key.expose().starts_with(provider.key_prefix()) {
            return Err(ProviderError::invalid_credential(format!(
                "{provider} api keys start with '{}'",
                provider.key_prefix()
            )));
        }

        self.credentials_mut()?.insert(provider, api_key);
        Ok(())
    }

    pub fn has_credentials(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.credentials_ref()?.contains_key(&provider))
    }

    pub fn with_api_key<R>(
        &self,
        provider: ProviderId,
        f: impl FnOnce(&str) -> R,
    ) -> Result<Option<R>, ProviderError> {
        let credentials = self.credentials_ref()?;
        Ok(credentials.get(&provider).map(|secret| f(secret.expose())))
    }

    pub fn clear(&self, provider: ProviderId) -> Result<bool, ProviderError> {
        Ok(self.credentials_mut()?.remove(&provider).is_some())
    }

    fn credentials_ref(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.credentials
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }

    fn credentials_mut(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ProviderId, SecretString>>, ProviderError> {
        self.credentials
            .lock()
            .map_err(|_| ProviderError::other("credential manager lock poisoned"))
    }
}

impl CredentialSource for SecureCredentialManager {
    fn credential(&self, provider: ProviderId) -> Option<String> {
        self.with_api_key(provider, str::to_string).ok().flatten()
    }
}

impl std::fmt::Debug for SecureCredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers = self
            .credentials_ref()
            .map(|credentials| credentials.keys().copied().collect::<Vec<_>>())
            .unwrap_or_default();

        f.debug_struct("SecureCredentialManager")
            .field("providers", &providers)
            .finish()
    }
}
