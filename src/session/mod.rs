//! Session state and the event handlers that mutate it.
//!
//! All per-session state lives in [`SessionState`] and is passed by
//! reference into each handler on [`Session`]. Handlers never fail: remote
//! errors become transcript text or returned warnings.

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::conversation::{ConversationTurn, EventLog, HistoryRecord, Role, TurnEvent};
use crate::error::{AppError, AppResult, FeedbackError, FeedbackResult};
use crate::feedback::{FeedbackEntry, FeedbackLedger, FeedbackSummarizer};
use crate::openai::{OpenAiClient, ReasoningEngine};
use crate::workflow::{AnswerOrchestrator, WorkflowInput};

/// Transcript, ledger and event log for one user session
#[derive(Debug, Clone)]
pub struct SessionState {
    id: Uuid,
    transcript: Vec<ConversationTurn>,
    ledger: FeedbackLedger,
    events: EventLog,
}

impl SessionState {
    /// Empty transcript, seeded ledger
    pub fn new() -> Self {
        Self::with_ledger(FeedbackLedger::new())
    }

    /// Empty transcript over an existing ledger
    pub fn with_ledger(ledger: FeedbackLedger) -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: Vec::new(),
            ledger,
            events: EventLog::new(),
        }
    }

    /// Session identifier used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Turns in display order
    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// Clinician feedback ledger
    pub fn ledger(&self) -> &FeedbackLedger {
        &self.ledger
    }

    /// Per-turn event log
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Text of the most recent assistant turn, if any
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.text.as_str())
    }

    fn history(&self) -> Vec<HistoryRecord> {
        self.transcript.iter().map(HistoryRecord::from).collect()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Event handlers for questions, operator replies and clinician feedback
#[derive(Clone)]
pub struct Session {
    orchestrator: AnswerOrchestrator,
    summarizer: FeedbackSummarizer,
}

impl Session {
    /// Build handlers from their parts
    pub fn new(orchestrator: AnswerOrchestrator, summarizer: FeedbackSummarizer) -> Self {
        Self {
            orchestrator,
            summarizer,
        }
    }

    /// Build handlers over any engine
    pub fn with_engine(engine: Arc<dyn ReasoningEngine>, config: &Config) -> Self {
        Self::new(
            AnswerOrchestrator::new(engine.clone(), config),
            FeedbackSummarizer::new(engine, &config.feedback),
        )
    }

    /// Build handlers backed by the OpenAI client
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = OpenAiClient::new(&config.openai, config.request.clone())
            .map_err(AppError::Engine)?;
        Ok(Self::with_engine(Arc::new(client), config))
    }

    /// Handle a user question.
    ///
    /// Appends the question and then the reply. A failed resolution appends
    /// `Error: <message>` as the reply. Blank questions are ignored and
    /// return `None`.
    pub async fn ask(&self, state: &mut SessionState, question: &str) -> Option<String> {
        if question.trim().is_empty() {
            return None;
        }

        let turn = state.transcript.len();
        state.transcript.push(ConversationTurn::user(question));

        let input = WorkflowInput::new(question)
            .with_history(state.history())
            .with_feedback(state.ledger.render());

        let reply = match self.orchestrator.resolve(&input).await {
            Ok(result) => {
                state.events.record(
                    turn,
                    std::iter::once(TurnEvent::UserText {
                        text: question.to_string(),
                    })
                    .chain(result.events),
                );
                result.message
            }
            Err(e) => {
                warn!(session_id = %state.id, error = %e, "Answer resolution failed");
                format!("Error: {}", e)
            }
        };

        state.transcript.push(ConversationTurn::assistant(reply.clone()));
        Some(reply)
    }

    /// Operator override: push a reply straight into the transcript.
    ///
    /// Returns false (and changes nothing) for blank text.
    pub fn inject_reply(&self, state: &mut SessionState, reply: &str) -> bool {
        let reply = reply.trim();
        if reply.is_empty() {
            return false;
        }
        info!(session_id = %state.id, "Operator reply injected");
        state.transcript.push(ConversationTurn::assistant(reply));
        true
    }

    /// Summarize clinician notes about the last reply and append to the ledger.
    ///
    /// On any error the ledger is unchanged; the error is a warning to show.
    pub async fn submit_feedback(
        &self,
        state: &mut SessionState,
        clinician_notes: &str,
    ) -> FeedbackResult<FeedbackEntry> {
        let last = state
            .last_assistant_message()
            .filter(|m| !m.is_empty())
            .ok_or(FeedbackError::NoAssistantMessage)?
            .to_string();

        let notes = clinician_notes.trim();
        if notes.is_empty() {
            return Err(FeedbackError::EmptyNotes);
        }

        let entry = self
            .summarizer
            .summarize(&last, notes)
            .await
            .map_err(FeedbackError::Summarizer)?;

        info!(
            session_id = %state.id,
            ledger_len = state.ledger.len() + 1,
            "Clinician feedback recorded"
        );
        state.ledger.append(entry.clone());
        Ok(entry)
    }
}
