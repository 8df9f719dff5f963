//! Conversation turns, history normalization and the per-turn event log.
//!
//! Prior turns arrive as loosely-typed `{role, content}` records. They are
//! normalized into role-tagged text turns before being replayed to the
//! reasoning engine; anything that does not fit is dropped without error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::openai::{InputMessage, OutputItem, OutputContent};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The patient
    User,
    /// The assistant or an operator speaking as it
    Assistant,
}

impl Role {
    /// Parse a role name; only `user` and `assistant` are accepted
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A canonical turn: role plus non-empty text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who spoke
    pub role: Role,
    /// What was said
    pub text: String,
}

impl ConversationTurn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    /// Convert to a Responses API input message
    pub fn to_input(&self) -> InputMessage {
        match self.role {
            Role::User => InputMessage::user(&self.text),
            Role::Assistant => InputMessage::assistant(&self.text),
        }
    }
}

/// Loosely-typed prior-turn record as supplied by callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Expected to be `"user"` or `"assistant"`; anything else is dropped
    #[serde(default)]
    pub role: Value,
    /// String, sequence of parts, or any other JSON value
    #[serde(default)]
    pub content: Value,
}

impl HistoryRecord {
    /// Record with a string role and string content
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: Value::String(role.to_string()),
            content: Value::String(content.into()),
        }
    }

    /// Record with arbitrary content
    pub fn with_content(role: &str, content: Value) -> Self {
        Self {
            role: Value::String(role.to_string()),
            content,
        }
    }
}

impl From<&ConversationTurn> for HistoryRecord {
    fn from(turn: &ConversationTurn) -> Self {
        HistoryRecord::new(&turn.role.to_string(), turn.text.clone())
    }
}

/// String-coerce a content field.
///
/// Strings are used verbatim and sequences are joined with single spaces
/// after coercing each element. Anything else is rendered as JSON text.
pub fn content_to_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(scalar_to_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => scalar_to_text(other),
    }
}

/// Coerce one value. Non-strings keep their JSON spelling (`true`, `null`,
/// `3.5`), so the text matches what a JSON-speaking caller sent.
fn scalar_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalize prior-turn records into canonical turns.
///
/// Records with a role other than `user`/`assistant`, or with null or empty
/// content, are skipped. Relative order is preserved; nothing is merged.
pub fn normalize_history(records: &[HistoryRecord]) -> Vec<ConversationTurn> {
    records
        .iter()
        .filter_map(|record| {
            let role = record.role.as_str().and_then(Role::parse)?;
            if record.content.is_null() {
                return None;
            }
            let text = content_to_text(&record.content);
            if text.is_empty() {
                return None;
            }
            Some(ConversationTurn { role, text })
        })
        .collect()
}

/// Build the turn sequence for one request.
///
/// When history normalizes to at least one turn it is authoritative and
/// `input_as_text` is ignored; otherwise a single user turn is synthesized.
pub fn build_turns(
    input_as_text: &str,
    history: Option<&[HistoryRecord]>,
) -> Vec<ConversationTurn> {
    let turns = history.map(normalize_history).unwrap_or_default();
    if turns.is_empty() {
        vec![ConversationTurn::user(input_as_text)]
    } else {
        turns
    }
}

/// Retrieval capability that produced a tool event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// File search over the knowledge vector store
    KnowledgeBase,
    /// Hosted web search
    WebSearch,
}

/// What happened during a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnEvent {
    /// The question that opened the turn
    UserText {
        /// Question text
        text: String,
    },
    /// Text produced by the engine
    AssistantText {
        /// Reply text
        text: String,
    },
    /// A retrieval capability was invoked
    ToolInvocation {
        /// Which capability
        tool: ToolKind,
        /// Queries or action, as reported by the engine
        detail: String,
    },
    /// A retrieval capability finished
    ToolResult {
        /// Which capability
        tool: ToolKind,
        /// Completion status reported by the engine
        status: String,
    },
}

/// Translate the engine's output items into turn events.
///
/// Reasoning items are not recorded.
pub fn events_from_output(items: &[OutputItem]) -> Vec<TurnEvent> {
    let mut events = Vec::new();

    for item in items {
        match item {
            OutputItem::FileSearchCall {
                status, queries, ..
            } => {
                events.push(TurnEvent::ToolInvocation {
                    tool: ToolKind::KnowledgeBase,
                    detail: queries.join("; "),
                });
                events.push(TurnEvent::ToolResult {
                    tool: ToolKind::KnowledgeBase,
                    status: status.clone().unwrap_or_else(|| "unknown".to_string()),
                });
            }
            OutputItem::WebSearchCall { status, action, .. } => {
                let detail = action
                    .as_ref()
                    .and_then(|a| a.get("query"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                events.push(TurnEvent::ToolInvocation {
                    tool: ToolKind::WebSearch,
                    detail,
                });
                events.push(TurnEvent::ToolResult {
                    tool: ToolKind::WebSearch,
                    status: status.clone().unwrap_or_else(|| "unknown".to_string()),
                });
            }
            OutputItem::Message { content, .. } => {
                for part in content {
                    if let OutputContent::OutputText { text } = part {
                        if !text.trim().is_empty() {
                            events.push(TurnEvent::AssistantText { text: text.clone() });
                        }
                    }
                }
            }
            OutputItem::Reasoning { .. } | OutputItem::Other => {}
        }
    }

    events
}

/// Event tagged with the index of the turn it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Transcript index of the question that opened the turn
    pub turn: usize,
    /// The event itself
    pub event: TurnEvent,
}

/// Append-only log of turn events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<LoggedEvent>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events for a turn
    pub fn record(&mut self, turn: usize, events: impl IntoIterator<Item = TurnEvent>) {
        self.events
            .extend(events.into_iter().map(|event| LoggedEvent { turn, event }));
    }

    /// Events belonging to one turn, in order
    pub fn for_turn(&self, turn: usize) -> impl Iterator<Item = &TurnEvent> {
        self.events
            .iter()
            .filter(move |e| e.turn == turn)
            .map(|e| &e.event)
    }

    /// All events in append order
    pub fn iter(&self) -> impl Iterator<Item = &LoggedEvent> {
        self.events.iter()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
