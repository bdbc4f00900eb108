//! Gemini `streamGenerateContent` decoder with Google Search grounding.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{Citation, DecodedEvent, SearchQuery, WebSearchResult};

use super::FrameDecoder;

pub const GOOGLE_SEARCH_LABEL: &str = "Google Search";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    grounding_supports: Vec<GroundingSupport>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingSupport {
    #[serde(default)]
    segment: Option<Segment>,
    #[serde(default)]
    grounding_chunk_indices: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    text: Option<String>,
}

/// Decoder state: URLs already reported, so repeated grounding chunks across events are
/// surfaced once.
#[derive(Debug, Default)]
pub struct GeminiDecoder {
    seen_urls: HashSet<String>,
}

impl GeminiDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn grounding_events(&mut self, metadata: GroundingMetadata) -> Vec<DecodedEvent> {
        let mut events = Vec::new();

        let new_results = metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter(|web| self.seen_urls.insert(web.uri.clone()))
            .map(|web| WebSearchResult::new(web.uri.clone(), web.title.clone()))
            .collect::<Vec<_>>();

        if !new_results.is_empty() {
            events.push(DecodedEvent::SearchQuery(SearchQuery::new(
                GOOGLE_SEARCH_LABEL,
                new_results,
            )));
        }

        for support in metadata.grounding_supports {
            let Some(cited_text) = support
                .segment
                .and_then(|segment| segment.text)
                .filter(|text| !text.is_empty())
            else {
                continue;
            };

            for index in support.grounding_chunk_indices.unwrap_or_default() {
                let Some(web) = metadata
                    .grounding_chunks
                    .get(index)
                    .and_then(|chunk| chunk.web.as_ref())
                else {
                    continue;
                };

                events.push(DecodedEvent::Citation(Citation::web_search_result_location(
                    web.uri.clone(),
                    web.title.clone(),
                    cited_text.clone(),
                )));
            }
        }

        events
    }
}

impl FrameDecoder for GeminiDecoder {
    fn decode_frame(&mut self, payload: &str) -> Result<Vec<DecodedEvent>, serde_json::Error> {
        let chunk = serde_json::from_str::<GeminiChunk>(payload)?;
        let Some(candidate) = chunk.candidates.into_iter().next() else {
            return Ok(Vec::new());
        };

        let mut events = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .filter(|text| !text.is_empty())
            .map(DecodedEvent::TextDelta)
            .collect::<Vec<_>>();

        if let Some(metadata) = candidate.grounding_metadata {
            events.extend(self.grounding_events(metadata));
        }

        Ok(events)
    }
}
