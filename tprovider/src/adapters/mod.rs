//! Wire-format decoders, one per provider stream dialect.
//!
//! Each decoder sees one SSE `data:` payload at a time and turns it into zero or more
//! [`DecodedEvent`]s. Decoders keep whatever cross-frame state their dialect needs; framing,
//! accumulation and cancellation live in [`crate::stream`].

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::{DecodedEvent, ProviderId};

pub use anthropic::AnthropicDecoder;
pub use gemini::GeminiDecoder;
pub use openai::OpenAiCompatibleDecoder;

pub trait FrameDecoder: Send {
    /// Decodes one frame payload. An error means the frame was malformed and is skipped.
    fn decode_frame(&mut self, payload: &str) -> Result<Vec<DecodedEvent>, serde_json::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Anthropic,
    Gemini,
    OpenAiCompatible,
}

impl WireFormat {
    pub fn for_provider(provider: ProviderId) -> Self {
        match provider {
            ProviderId::Claude => Self::Anthropic,
            ProviderId::Gemini => Self::Gemini,
            ProviderId::Groq => Self::OpenAiCompatible,
        }
    }

    pub fn decoder(self) -> Box<dyn FrameDecoder> {
        match self {
            Self::Anthropic => Box::new(AnthropicDecoder::new()),
            Self::Gemini => Box::new(GeminiDecoder::new()),
            Self::OpenAiCompatible => Box::new(OpenAiCompatibleDecoder::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_provider_maps_to_its_dialect() {
        assert_eq!(WireFormat::for_provider(ProviderId::Claude), WireFormat::Anthropic);
        assert_eq!(WireFormat::for_provider(ProviderId::Gemini), WireFormat::Gemini);
        assert_eq!(
            WireFormat::for_provider(ProviderId::Groq),
            WireFormat::OpenAiCompatible
        );
    }
}
