//! Static model catalog: which models each provider offers and what each provider supports.
//!
//! ```rust
//! use tprovider::{ModelCatalog, ProviderId};
//!
//! assert_eq!(ProviderId::Groq.default_model(), "llama-3.3-70b-versatile");
//! assert_eq!(
//!     ModelCatalog::provider_for_model("gemini-2.0-flash"),
//!     Some(ProviderId::Gemini)
//! );
//! assert!(!ProviderId::Groq.supports_web_search());
//! ```

use crate::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub provider: ProviderId,
}

const CLAUDE_MODELS: &[ModelOption] = &[
    ModelOption {
        id: "claude-sonnet-4-20250514",
        name: "Claude Sonnet 4",
        description: "Balanced speed and intelligence",
        provider: ProviderId::Claude,
    },
    ModelOption {
        id: "claude-opus-4-20250514",
        name: "Claude Opus 4",
        description: "Most capable for complex tasks",
        provider: ProviderId::Claude,
    },
    ModelOption {
        id: "claude-3-5-haiku-20241022",
        name: "Claude Haiku 3.5",
        description: "Fast and lightweight",
        provider: ProviderId::Claude,
    },
];

const GEMINI_MODELS: &[ModelOption] = &[
    ModelOption {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        description: "Fast multimodal model with thinking",
        provider: ProviderId::Gemini,
    },
    ModelOption {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        description: "Previous generation flash model",
        provider: ProviderId::Gemini,
    },
];

const GROQ_MODELS: &[ModelOption] = &[
    ModelOption {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B",
        description: "Versatile open model on Groq",
        provider: ProviderId::Groq,
    },
    ModelOption {
        id: "llama-3.1-8b-instant",
        name: "Llama 3.1 8B",
        description: "Low-latency small model on Groq",
        provider: ProviderId::Groq,
    },
];

impl ProviderId {
    /// Offered models, default first.
    pub fn models(self) -> &'static [ModelOption] {
        match self {
            Self::Claude => CLAUDE_MODELS,
            Self::Gemini => GEMINI_MODELS,
            Self::Groq => GROQ_MODELS,
        }
    }

    pub fn default_model(self) -> &'static str {
        self.models()[0].id
    }

    pub fn has_model(self, model: &str) -> bool {
        self.models().iter().any(|option| option.id == model)
    }

    pub fn supports_web_search(self) -> bool {
        !matches!(self, Self::Groq)
    }

    /// Prefix every well-formed key for this provider starts with.
    pub fn key_prefix(self) -> &'static str {
        match self {
            Self::Claude => "sk-ant-",
            Self::Gemini => "AIzaSy",
            Self::Groq => "gsk_",
        }
    }
}

pub struct ModelCatalog;

impl ModelCatalog {
    pub fn all() -> impl Iterator<Item = &'static ModelOption> {
        ProviderId::ALL
            .into_iter()
            .flat_map(|provider| provider.models().iter())
    }

    pub fn find(model: &str) -> Option<&'static ModelOption> {
        Self::all().find(|option| option.id == model)
    }

    pub fn provider_for_model(model: &str) -> Option<ProviderId> {
        Self::find(model).map(|option| option.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_a_default_model_it_owns() {
        for provider in ProviderId::ALL {
            let default = provider.default_model();
            assert!(provider.has_model(default));
            assert_eq!(ModelCatalog::provider_for_model(default), Some(provider));
        }
    }

    #[test]
    fn model_ids_are_unique_across_providers() {
        let ids = ModelCatalog::all().map(|option| option.id).collect::<Vec<_>>();
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();

        assert_eq!(ids.len(), deduped.len());
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn unknown_models_resolve_to_nothing() {
        assert!(ModelCatalog::find("gpt-4o").is_none());
        assert!(!ProviderId::Claude.has_model("gemini-2.5-flash"));
    }
}
