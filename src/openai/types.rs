use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SearchContextSize;

/// Speaker of an input message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One typed content part of an input message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    InputText { text: String },
    OutputText { text: String },
}

/// Message item in the `input` array of a Responses request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: MessageRole,
    pub content: Vec<ContentPart>,
}

/// Hosted capability the model may call during its own agentic loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// Semantic lookup over a hosted vector store
    FileSearch { vector_store_ids: Vec<String> },
    /// Hosted web search
    WebSearchPreview {
        search_context_size: SearchContextSize,
        user_location: UserLocation,
    },
}

/// Location hint for web search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Reasoning effort level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

/// Reasoning options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningOptions {
    pub effort: ReasoningEffort,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Output verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Low,
    Medium,
    High,
}

/// Text output options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    pub verbosity: Verbosity,
}

/// Request body for `POST /v1/responses`
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Always false; replies are consumed whole
    pub stream: bool,
}

/// Response body from `POST /v1/responses`
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Aggregated text, present on some deployments
    #[serde(default)]
    pub output_text: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One item the model produced during its run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    FileSearchCall {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        queries: Vec<String>,
    },
    WebSearchCall {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        action: Option<serde_json::Value>,
    },
    Reasoning {
        #[serde(default)]
        id: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Content of an output message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText {
        text: String,
    },
    Refusal {
        refusal: String,
    },
    #[serde(other)]
    Other,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl InputMessage {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }

    /// Create an assistant message; assistant text is replayed as `output_text`
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentPart::OutputText { text: text.into() }],
        }
    }

    /// Concatenated text of all parts
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|part| match part {
                ContentPart::InputText { text } | ContentPart::OutputText { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Tool {
    /// File search scoped to one knowledge collection
    pub fn file_search(vector_store_id: impl Into<String>) -> Self {
        Tool::FileSearch {
            vector_store_ids: vec![vector_store_id.into()],
        }
    }

    /// Web search with an approximate user location
    pub fn web_search(search_context_size: SearchContextSize) -> Self {
        Tool::WebSearchPreview {
            search_context_size,
            user_location: UserLocation {
                kind: "approximate".to_string(),
            },
        }
    }
}

impl ResponsesRequest {
    /// Create a new request with model and input
    pub fn new(model: impl Into<String>, input: Vec<InputMessage>) -> Self {
        Self {
            model: model.into(),
            instructions: None,
            input,
            tools: Vec::new(),
            reasoning: None,
            text: None,
            store: None,
            metadata: None,
            stream: false,
        }
    }

    /// Set the instruction document
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Add a hosted tool
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set reasoning effort and optional summary mode
    pub fn with_reasoning(mut self, effort: ReasoningEffort, summary: Option<&str>) -> Self {
        self.reasoning = Some(ReasoningOptions {
            effort,
            summary: summary.map(str::to_string),
        });
        self
    }

    /// Set text verbosity
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.text = Some(TextOptions { verbosity });
        self
    }

    /// Ask the service to store the response
    pub fn with_store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    /// Add a single metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl ResponsesResponse {
    /// Final answer text.
    ///
    /// Prefers the aggregated `output_text`, then the `output_text` parts of
    /// message items in order. Whitespace-only text counts as absent.
    pub fn text(&self) -> Option<String> {
        if let Some(text) = self.output_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }

        let parts: Vec<&str> = self
            .output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|content| match content {
                OutputContent::OutputText { text } => Some(text.trim()),
                _ => None,
            })
            .filter(|text| !text.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    /// Number of hosted tool calls the model made
    pub fn tool_call_count(&self) -> usize {
        self.output
            .iter()
            .filter(|item| {
                matches!(
                    item,
                    OutputItem::FileSearchCall { .. } | OutputItem::WebSearchCall { .. }
                )
            })
            .count()
    }
}
