//! Clinician feedback ledger and summarizer.
//!
//! A clinician's free-text critique of the last assistant reply is
//! compressed by the reasoning engine into one generalizable directive and
//! appended to the session ledger. The ledger never shrinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::FeedbackConfig;
use crate::error::{EngineError, EngineResult};
use crate::openai::{InputMessage, ReasoningEffort, ReasoningEngine, ResponsesRequest, Verbosity};
use crate::prompts::{DEFAULT_FEEDBACK, FEEDBACK_SUMMARY_PROMPT};

/// One generalized clinician directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Directive text as folded into the prompt
    pub text: String,
    /// When the directive was recorded
    pub created_at: DateTime<Utc>,
}

impl FeedbackEntry {
    /// Entry stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only ordered list of feedback entries
#[derive(Debug, Clone)]
pub struct FeedbackLedger {
    entries: Vec<FeedbackEntry>,
}

impl FeedbackLedger {
    /// Ledger seeded with the default directive
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_FEEDBACK)
    }

    /// Ledger seeded with a custom first entry
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            entries: vec![FeedbackEntry::new(seed)],
        }
    }

    /// Append an entry; existing entries are never touched
    pub fn append(&mut self, entry: FeedbackEntry) {
        self.entries.push(entry);
    }

    /// Entries in ledger order (oldest first)
    pub fn entries(&self) -> &[FeedbackEntry] {
        &self.entries
    }

    /// Number of entries, seed included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a bulleted list in ledger order, one `- ` line per entry
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("- {}", e.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Operator-facing feed: each entry with its recording time, ledger order
    pub fn feed(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("- [{}] {}", e.created_at.format("%Y-%m-%d %H:%M UTC"), e.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for FeedbackLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns `(last reply, clinician notes)` into a [`FeedbackEntry`]
#[derive(Clone)]
pub struct FeedbackSummarizer {
    engine: Arc<dyn ReasoningEngine>,
    model: String,
}

impl FeedbackSummarizer {
    /// Summarizer using the configured feedback model
    pub fn new(engine: Arc<dyn ReasoningEngine>, config: &FeedbackConfig) -> Self {
        Self {
            engine,
            model: config.model.clone(),
        }
    }

    /// Summarize a critique into one directive.
    ///
    /// Both arguments are expected to be non-empty; callers check this.
    /// The engine output is trimmed and otherwise taken verbatim.
    pub async fn summarize(
        &self,
        last_assistant_message: &str,
        clinician_notes: &str,
    ) -> EngineResult<FeedbackEntry> {
        let start = Instant::now();
        let request = self.build_request(last_assistant_message, clinician_notes);

        debug!(model = %self.model, "Summarizing clinician feedback");

        let response = self.engine.respond(request).await?;
        let text = response.text().ok_or(EngineError::EmptyOutput)?;
        let text = text.trim().to_string();

        info!(
            latency_ms = start.elapsed().as_millis(),
            chars = text.len(),
            "Clinician feedback summarized"
        );

        Ok(FeedbackEntry::new(text))
    }

    fn build_request(&self, last_assistant_message: &str, clinician_notes: &str) -> ResponsesRequest {
        ResponsesRequest::new(
            &self.model,
            vec![
                InputMessage::system(FEEDBACK_SUMMARY_PROMPT),
                InputMessage::user(format!(
                    "Last assistant message:\n{}\n\nClinician notes:\n{}",
                    last_assistant_message, clinician_notes
                )),
            ],
        )
        .with_reasoning(ReasoningEffort::Minimal, None)
        .with_verbosity(Verbosity::Low)
    }
}
