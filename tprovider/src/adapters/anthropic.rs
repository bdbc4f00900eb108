//! Anthropic messages-stream decoder.
//!
//! Besides `text_delta` fragments this tracks the server-side `web_search` tool: the query is
//! recovered from streamed `input_json_delta` fragments and paired with the next
//! `web_search_tool_result` block.

use serde::Deserialize;
use serde_json::Value;

use crate::{Citation, DecodedEvent, SearchQuery, WebSearchResult};

use super::FrameDecoder;

const WEB_SEARCH_TOOL: &str = "web_search";
const WEB_SEARCH_RESULT: &str = "web_search_result";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicEvent {
    ContentBlockStart { content_block: ContentBlock },
    ContentBlockDelta { delta: BlockDelta },
    ContentBlockStop,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ServerToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    WebSearchToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: ToolResultContent,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolResultContent {
    Items(Vec<ResultItem>),
    Error(Value),
}

impl Default for ToolResultContent {
    fn default() -> Self {
        Self::Error(Value::Null)
    }
}

#[derive(Debug, Deserialize)]
struct ResultItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    page_age: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
        #[serde(default)]
        citations: Option<Vec<RawCitation>>,
    },
    InputJsonDelta {
        #[serde(default)]
        partial_json: String,
    },
    CitationsDelta {
        citation: RawCitation,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawCitation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    cited_text: String,
}

impl RawCitation {
    fn into_citation(self) -> Option<Citation> {
        if self.kind != Citation::WEB_SEARCH_RESULT_LOCATION {
            return None;
        }

        Some(Citation {
            kind: self.kind,
            url: self.url,
            title: self.title.unwrap_or_default(),
            cited_text: self.cited_text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Default)]
pub struct AnthropicDecoder {
    search_id: Option<String>,
    search_query: Option<String>,
    partial_json: String,
}

impl AnthropicDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn start_block(&mut self, block: ContentBlock) -> Vec<DecodedEvent> {
        match block {
            ContentBlock::ServerToolUse { id, name, input } if name == WEB_SEARCH_TOOL => {
                self.search_id = Some(id);
                self.search_query = query_from_input(&input);
                Vec::new()
            }
            ContentBlock::WebSearchToolResult {
                tool_use_id,
                content,
            } => self.finish_search(tool_use_id, content),
            _ => Vec::new(),
        }
    }

    fn finish_search(
        &mut self,
        tool_use_id: Option<String>,
        content: ToolResultContent,
    ) -> Vec<DecodedEvent> {
        let search_id = self.search_id.take();
        let query = self.search_query.take();

        if let (Some(expected), Some(actual)) = (search_id.as_deref(), tool_use_id.as_deref()) {
            if expected != actual {
                tracing::warn!(
                    phase = "decode",
                    format = "anthropic",
                    expected,
                    actual,
                    "web search result does not match the outstanding tool use"
                );
            }
        }

        let ToolResultContent::Items(items) = content else {
            return Vec::new();
        };

        let results = items
            .into_iter()
            .filter(|item| item.kind == WEB_SEARCH_RESULT)
            .map(|item| WebSearchResult {
                url: item.url,
                title: item.title.unwrap_or_default(),
                page_age: item.page_age,
            })
            .collect::<Vec<_>>();

        match query {
            Some(query) if !results.is_empty() => {
                vec![DecodedEvent::SearchQuery(SearchQuery::new(query, results))]
            }
            _ => Vec::new(),
        }
    }

    fn apply_delta(&mut self, delta: BlockDelta) -> Vec<DecodedEvent> {
        match delta {
            BlockDelta::TextDelta { text, citations } => {
                let mut events = Vec::new();
                if !text.is_empty() {
                    events.push(DecodedEvent::TextDelta(text));
                    events.extend(
                        citations
                            .unwrap_or_default()
                            .into_iter()
                            .filter_map(RawCitation::into_citation)
                            .map(DecodedEvent::Citation),
                    );
                }
                events
            }
            BlockDelta::InputJsonDelta { partial_json } => {
                if self.search_id.is_some() {
                    self.partial_json.push_str(&partial_json);
                    // An incomplete buffer simply fails to parse until the closing fragment.
                    if let Ok(input) = serde_json::from_str::<SearchInput>(&self.partial_json) {
                        if let Some(query) = input.query.filter(|query| !query.is_empty()) {
                            self.search_query = Some(query);
                        }
                    }
                }
                Vec::new()
            }
            BlockDelta::CitationsDelta { citation } => citation
                .into_citation()
                .map(DecodedEvent::Citation)
                .into_iter()
                .collect(),
            BlockDelta::Other => Vec::new(),
        }
    }
}

fn query_from_input(input: &Value) -> Option<String> {
    input
        .get("query")
        .and_then(Value::as_str)
        .filter(|query| !query.is_empty())
        .map(str::to_string)
}

impl FrameDecoder for AnthropicDecoder {
    fn decode_frame(&mut self, payload: &str) -> Result<Vec<DecodedEvent>, serde_json::Error> {
        let event = serde_json::from_str::<AnthropicEvent>(payload)?;

        let events = match event {
            AnthropicEvent::ContentBlockStart { content_block } => self.start_block(content_block),
            AnthropicEvent::ContentBlockDelta { delta } => self.apply_delta(delta),
            AnthropicEvent::ContentBlockStop => {
                self.partial_json.clear();
                Vec::new()
            }
            AnthropicEvent::Other => Vec::new(),
        };

        Ok(events)
    }
}
