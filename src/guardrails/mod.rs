//! Guardrail verdicts and hallucination screening.
//!
//! The aggregation helpers are pure functions over a verdict list; they
//! never call the evaluation service. [`HallucinationGuardrail`] produces
//! verdicts by asking the reasoning engine to fact-check a candidate reply
//! against the knowledge base.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AgentConfig, GuardrailConfig};
use crate::conversation::{ConversationTurn, Role};
use crate::error::{EngineError, EngineResult};
use crate::openai::{InputMessage, ReasoningEffort, ReasoningEngine, ResponsesRequest, Tool};
use crate::prompts::HALLUCINATION_CHECK_PROMPT;

/// Name reported in verdict info
pub const HALLUCINATION_GUARDRAIL_NAME: &str = "Hallucination Detection";

/// Info keys copied into a failure report
const FAILURE_KEYS: [&str; 6] = [
    "flagged",
    "confidence",
    "threshold",
    "hallucination_type",
    "hallucinated_statements",
    "verified_statements",
];

/// Outcome of one guardrail check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    /// Whether the reply should be treated as failing this check
    pub tripwire_triggered: bool,
    /// Check-specific details, including `checked_text` when available
    #[serde(default)]
    pub info: Map<String, Value>,
}

/// One triggered guardrail in a failure report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailFailure {
    /// Name of the guardrail that tripped
    pub guardrail_name: Option<String>,
    /// Diagnostic fields copied from the verdict
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Summary of triggered guardrails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailReport {
    /// Whether any guardrail tripped
    pub failed: bool,
    /// One entry per tripped guardrail
    pub failures: Vec<GuardrailFailure>,
}

/// True if any verdict tripped
pub fn any_tripwire_triggered(verdicts: &[GuardrailVerdict]) -> bool {
    verdicts.iter().any(|v| v.tripwire_triggered)
}

/// Sanitized text from the first verdict carrying `checked_text`.
///
/// A present-but-empty or non-string value yields the fallback.
pub fn checked_text(verdicts: &[GuardrailVerdict], fallback: &str) -> String {
    verdicts
        .iter()
        .find_map(|v| v.info.get("checked_text"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Collect the triggered verdicts into a report
pub fn failure_report(verdicts: &[GuardrailVerdict]) -> GuardrailReport {
    let failures: Vec<GuardrailFailure> = verdicts
        .iter()
        .filter(|v| v.tripwire_triggered)
        .map(|v| GuardrailFailure {
            guardrail_name: v
                .info
                .get("guardrail_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            details: FAILURE_KEYS
                .iter()
                .filter_map(|key| v.info.get(*key).map(|value| (key.to_string(), value.clone())))
                .collect(),
        })
        .collect();

    GuardrailReport {
        failed: !failures.is_empty(),
        failures,
    }
}

/// Fact-check assessment returned by the engine
#[derive(Debug, Clone, Default, Deserialize)]
struct Assessment {
    #[serde(default)]
    flagged: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    hallucination_type: Option<String>,
    #[serde(default)]
    hallucinated_statements: Vec<String>,
    #[serde(default)]
    verified_statements: Vec<String>,
}

/// Screens replies for claims the knowledge base does not support
#[derive(Clone)]
pub struct HallucinationGuardrail {
    engine: Arc<dyn ReasoningEngine>,
    model: String,
    knowledge_source: String,
    confidence_threshold: f64,
}

impl HallucinationGuardrail {
    /// Guardrail checking against the agent's knowledge store
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        config: &GuardrailConfig,
        agent: &AgentConfig,
    ) -> Self {
        Self {
            engine,
            model: config.model.clone(),
            knowledge_source: agent.vector_store_id.clone(),
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Evaluate a candidate reply in the context of the conversation.
    ///
    /// Engine failures propagate. An assessment that cannot be parsed gives
    /// a non-triggered verdict with an `error` entry.
    pub async fn evaluate(
        &self,
        candidate: &str,
        context: &[ConversationTurn],
    ) -> EngineResult<Vec<GuardrailVerdict>> {
        let question = context
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.text.as_str())
            .unwrap_or_default();

        let request = ResponsesRequest::new(
            &self.model,
            vec![InputMessage::user(format!(
                "User question:\n{}\n\nCandidate reply:\n{}",
                question, candidate
            ))],
        )
        .with_instructions(HALLUCINATION_CHECK_PROMPT)
        .with_tool(Tool::file_search(&self.knowledge_source))
        .with_reasoning(ReasoningEffort::Low, None);

        let response = self.engine.respond(request).await?;
        let text = response.text().ok_or(EngineError::EmptyOutput)?;

        let mut info = Map::new();
        info.insert(
            "guardrail_name".to_string(),
            Value::String(HALLUCINATION_GUARDRAIL_NAME.to_string()),
        );
        info.insert("checked_text".to_string(), Value::String(candidate.to_string()));
        info.insert("threshold".to_string(), Value::from(self.confidence_threshold));

        let assessment = match parse_assessment(&text) {
            Some(a) => a,
            None => {
                warn!(raw = %text, "Unparseable hallucination assessment");
                info.insert(
                    "error".to_string(),
                    Value::String("unparseable assessment".to_string()),
                );
                return Ok(vec![GuardrailVerdict {
                    tripwire_triggered: false,
                    info,
                }]);
            }
        };

        let tripwire_triggered =
            assessment.flagged && assessment.confidence >= self.confidence_threshold;

        debug!(
            flagged = assessment.flagged,
            confidence = assessment.confidence,
            tripwire = tripwire_triggered,
            "Hallucination assessment received"
        );

        info.insert("flagged".to_string(), Value::Bool(assessment.flagged));
        info.insert("confidence".to_string(), Value::from(assessment.confidence));
        if let Some(reasoning) = assessment.reasoning {
            info.insert("reasoning".to_string(), Value::String(reasoning));
        }
        info.insert(
            "hallucination_type".to_string(),
            assessment
                .hallucination_type
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        info.insert(
            "hallucinated_statements".to_string(),
            Value::from(assessment.hallucinated_statements),
        );
        info.insert(
            "verified_statements".to_string(),
            Value::from(assessment.verified_statements),
        );

        Ok(vec![GuardrailVerdict {
            tripwire_triggered,
            info,
        }])
    }
}

/// Parse an assessment from raw JSON or the first fenced block in the reply
fn parse_assessment(text: &str) -> Option<Assessment> {
    serde_json::from_str(extract_json(text)?).ok()
}

/// Locate the JSON payload in a completion.
///
/// Raw JSON wins, then a ```json block, then any ``` block.
fn extract_json(completion: &str) -> Option<&str> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }

    let block = if completion.contains("```json") {
        completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
    } else {
        completion.split("```").nth(1)
    };

    block.map(str::trim).filter(|s| !s.is_empty())
}
