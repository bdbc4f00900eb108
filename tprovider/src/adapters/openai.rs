//! OpenAI-compatible chat-completions stream decoder (Groq).

use serde::Deserialize;

use crate::DecodedEvent;

use super::FrameDecoder;

#[derive(Debug, Deserialize)]
struct OpenAiApiStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAiApiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiApiStreamChoice {
    #[serde(default)]
    delta: OpenAiApiDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiApiDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default)]
pub struct OpenAiCompatibleDecoder;

impl OpenAiCompatibleDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for OpenAiCompatibleDecoder {
    fn decode_frame(&mut self, payload: &str) -> Result<Vec<DecodedEvent>, serde_json::Error> {
        let parsed = serde_json::from_str::<OpenAiApiStreamResponse>(payload)?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(DecodedEvent::TextDelta)
            .into_iter()
            .collect())
    }
}
