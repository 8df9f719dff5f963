//! Answer orchestration.
//!
//! One request: normalize the turns, assemble instructions, invoke the
//! reasoning engine once with the knowledge-base and web-search
//! capabilities, and return its final text. Failures propagate to the
//! caller unchanged.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{AgentConfig, Config};
use crate::conversation::{build_turns, events_from_output, ConversationTurn, HistoryRecord, TurnEvent};
use crate::error::{AppResult, EngineError};
use crate::guardrails::{any_tripwire_triggered, checked_text, failure_report, HallucinationGuardrail};
use crate::openai::{ReasoningEffort, ReasoningEngine, ResponsesRequest, Tool};
use crate::policy::assemble_instructions;

/// Trace source recorded with every answer request
pub const TRACE_SOURCE: &str = "agent-builder";

/// Unit of work for the orchestrator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowInput {
    /// Current question; used only when the history yields no turns
    pub input_as_text: String,
    /// Prior turns, current question last
    #[serde(default)]
    pub conversation_history: Option<Vec<HistoryRecord>>,
    /// Pre-rendered ledger text, passed through opaquely
    #[serde(default)]
    pub clinician_feedback: Option<String>,
}

impl WorkflowInput {
    /// Input with no history and no feedback
    pub fn new(input_as_text: impl Into<String>) -> Self {
        Self {
            input_as_text: input_as_text.into(),
            conversation_history: None,
            clinician_feedback: None,
        }
    }

    /// Attach prior turns
    pub fn with_history(mut self, history: Vec<HistoryRecord>) -> Self {
        self.conversation_history = Some(history);
        self
    }

    /// Attach the rendered feedback ledger
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.clinician_feedback = Some(feedback.into());
        self
    }
}

/// Final reply plus what happened while producing it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Reply shown to the user
    pub message: String,
    /// Events recorded while resolving the reply
    #[serde(default)]
    pub events: Vec<TurnEvent>,
}

/// Runs the answer-resolution policy against the reasoning engine
#[derive(Clone)]
pub struct AnswerOrchestrator {
    engine: Arc<dyn ReasoningEngine>,
    agent: AgentConfig,
    guardrail: Option<HallucinationGuardrail>,
}

impl AnswerOrchestrator {
    /// Create an orchestrator; the guardrail is attached only when enabled
    pub fn new(engine: Arc<dyn ReasoningEngine>, config: &Config) -> Self {
        let guardrail = config
            .guardrails
            .enabled
            .then(|| HallucinationGuardrail::new(engine.clone(), &config.guardrails, &config.agent));

        Self {
            engine,
            agent: config.agent.clone(),
            guardrail,
        }
    }

    /// Create an orchestrator without reply screening
    pub fn unguarded(engine: Arc<dyn ReasoningEngine>, agent: AgentConfig) -> Self {
        Self {
            engine,
            agent,
            guardrail: None,
        }
    }

    /// Resolve one request into a reply
    pub async fn resolve(&self, input: &WorkflowInput) -> AppResult<WorkflowResult> {
        let start = Instant::now();

        let turns = build_turns(&input.input_as_text, input.conversation_history.as_deref());
        let instructions = assemble_instructions(input.clinician_feedback.as_deref());

        debug!(
            turns = turns.len(),
            has_feedback = input.clinician_feedback.is_some(),
            "Resolving answer"
        );

        let request = self.build_request(instructions, &turns);
        let response = self.engine.respond(request).await?;
        let text = response.text().ok_or(EngineError::EmptyOutput)?;

        let mut events = events_from_output(&response.output);
        if !events
            .iter()
            .any(|e| matches!(e, TurnEvent::AssistantText { .. }))
        {
            events.push(TurnEvent::AssistantText { text: text.clone() });
        }

        let message = match &self.guardrail {
            Some(guardrail) => screen(guardrail, text, &turns).await,
            None => text,
        };

        info!(
            latency_ms = start.elapsed().as_millis(),
            tool_calls = response.tool_call_count(),
            "Answer resolved"
        );

        Ok(WorkflowResult { message, events })
    }

    /// Build the Responses request for a turn sequence
    pub fn build_request(&self, instructions: String, turns: &[ConversationTurn]) -> ResponsesRequest {
        let input = turns.iter().map(ConversationTurn::to_input).collect();

        ResponsesRequest::new(&self.agent.model, input)
            .with_instructions(instructions)
            .with_tool(Tool::file_search(&self.agent.vector_store_id))
            .with_tool(Tool::web_search(self.agent.search_context_size))
            .with_reasoning(ReasoningEffort::Low, Some("auto"))
            .with_store(true)
            .with_metadata("__trace_source__", TRACE_SOURCE)
            .with_metadata("workflow_id", &self.agent.workflow_id)
    }
}

/// Screen a reply; screening failures never block it
async fn screen(guardrail: &HallucinationGuardrail, text: String, turns: &[ConversationTurn]) -> String {
    match guardrail.evaluate(&text, turns).await {
        Ok(verdicts) => {
            if any_tripwire_triggered(&verdicts) {
                let report = failure_report(&verdicts);
                warn!(
                    failures = %serde_json::to_string(&report.failures).unwrap_or_default(),
                    "Guardrail tripwire triggered"
                );
            }
            checked_text(&verdicts, &text)
        }
        Err(e) => {
            warn!(error = %e, "Guardrail evaluation failed; returning unscreened reply");
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchContextSize;
    use crate::error::EngineResult;
    use crate::openai::{MessageRole, ResponsesResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingEngine {
        reply: serde_json::Value,
        seen: Mutex<Vec<ResponsesRequest>>,
    }

    #[async_trait]
    impl ReasoningEngine for RecordingEngine {
        async fn respond(&self, request: ResponsesRequest) -> EngineResult<ResponsesResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(serde_json::from_value(self.reply.clone()).unwrap())
        }
    }

    fn orchestrator(reply: serde_json::Value) -> (AnswerOrchestrator, Arc<RecordingEngine>) {
        let engine = Arc::new(RecordingEngine {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        (
            AnswerOrchestrator::unguarded(engine.clone(), AgentConfig::default()),
            engine,
        )
    }

    #[tokio::test]
    async fn test_resolve_without_history_sends_one_user_turn() {
        let (orch, engine) = orchestrator(json!({"output_text": "Reply"}));
        let result = orch.resolve(&WorkflowInput::new("Hello")).await.unwrap();

        assert_eq!(result.message, "Reply");
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].input.len(), 1);
        assert_eq!(seen[0].input[0].role, MessageRole::User);
        assert_eq!(seen[0].input[0].text(), "Hello");
    }

    #[tokio::test]
    async fn test_resolve_replays_history_and_ignores_input_text() {
        let (orch, engine) = orchestrator(json!({"output_text": "Reply"}));
        let input = WorkflowInput::new("ignored").with_history(vec![
            HistoryRecord::new("user", "q1"),
            HistoryRecord::new("assistant", "a1"),
            HistoryRecord::new("user", "q2"),
        ]);
        orch.resolve(&input).await.unwrap();

        let seen = engine.seen.lock().unwrap();
        let texts: Vec<String> = seen[0].input.iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2"]);
    }

    #[tokio::test]
    async fn test_resolve_request_carries_policy_tools_and_trace() {
        let (orch, engine) = orchestrator(json!({"output_text": "Reply"}));
        orch.resolve(&WorkflowInput::new("q").with_feedback("- E1\n- E2"))
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap();
        let request = &seen[0];
        let instructions = request.instructions.as_deref().unwrap();
        assert!(instructions.contains("- E1\n- E2"));

        assert_eq!(
            request.tools,
            vec![
                Tool::file_search(crate::config::DEFAULT_VECTOR_STORE_ID),
                Tool::web_search(SearchContextSize::Medium),
            ]
        );
        assert_eq!(
            request.reasoning.as_ref().map(|r| r.effort),
            Some(ReasoningEffort::Low)
        );
        assert_eq!(request.store, Some(true));
        let metadata = request.metadata.as_ref().unwrap();
        assert_eq!(metadata.get("__trace_source__").map(String::as_str), Some(TRACE_SOURCE));
        assert_eq!(
            metadata.get("workflow_id").map(String::as_str),
            Some(crate::config::DEFAULT_WORKFLOW_ID)
        );
    }

    #[tokio::test]
    async fn test_resolve_records_tool_events() {
        let (orch, _) = orchestrator(json!({
            "output": [
                {"type": "file_search_call", "status": "completed", "queries": ["foods"]},
                {"type": "message", "content": [{"type": "output_text", "text": "Eat well. Source: knowledge base"}]}
            ]
        }));
        let result = orch.resolve(&WorkflowInput::new("q")).await.unwrap();

        assert_eq!(result.message, "Eat well. Source: knowledge base");
        assert_eq!(result.events.len(), 3);
        assert!(matches!(result.events[0], TurnEvent::ToolInvocation { .. }));
    }

    #[tokio::test]
    async fn test_resolve_adds_assistant_event_for_top_level_text() {
        let (orch, _) = orchestrator(json!({"output_text": "Only text"}));
        let result = orch.resolve(&WorkflowInput::new("q")).await.unwrap();
        assert_eq!(
            result.events,
            vec![TurnEvent::AssistantText {
                text: "Only text".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_resolve_empty_output_is_error() {
        let (orch, _) = orchestrator(json!({"output": []}));
        let err = orch.resolve(&WorkflowInput::new("q")).await.unwrap_err();
        assert_eq!(err.to_string(), "Reasoning engine returned no text output");
    }

    #[test]
    fn test_workflow_input_deserializes_optional_fields() {
        let input: WorkflowInput = serde_json::from_value(json!({"input_as_text": "hi"})).unwrap();
        assert!(input.conversation_history.is_none());
        assert!(input.clinician_feedback.is_none());
    }
}
