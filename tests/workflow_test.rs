//! Integration tests for the full Session → Orchestrator → Responses API flow
//!
//! The reasoning engine is mocked with wiremock; these tests verify what is
//! sent for each scenario and how replies and failures reach the transcript.

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

use antenatal_assistant::config::{
    AgentConfig, Config, FeedbackConfig, GuardrailConfig, LogFormat, LoggingConfig, OpenAiConfig,
    RequestConfig,
};
use antenatal_assistant::conversation::Role;
use antenatal_assistant::prompts::{MEDICAL_REDIRECTION, OUT_OF_SCOPE_REFUSAL};
use antenatal_assistant::{Session, SessionState};

/// Create test configuration with mock server URL
fn create_test_config(mock_url: &str) -> Config {
    Config {
        openai: OpenAiConfig {
            api_key: Some("test-api-key".to_string()),
            base_url: mock_url.to_string(),
        },
        agent: AgentConfig {
            vector_store_id: "vs_test_kb".to_string(),
            ..AgentConfig::default()
        },
        feedback: FeedbackConfig::default(),
        guardrails: GuardrailConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        },
        request: RequestConfig {
            timeout_ms: 5000,
            max_retries: 0,
            retry_delay_ms: 10,
        },
    }
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "output": [
            {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": text}]}
        ]
    }))
}

#[tokio::test]
async fn test_knowledge_base_answer_flow() {
    let mock_server = MockServer::start().await;
    let kb_reply = "A nutritious pregnancy diet includes fruits, vegetables, whole grains and lean protein. Source: knowledge base. Would you like meal planning tips?";

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_partial_json(json!({
            "tools": [
                {"type": "file_search", "vector_store_ids": ["vs_test_kb"]},
                {"type": "web_search_preview", "search_context_size": "medium",
                 "user_location": {"type": "approximate"}}
            ],
            "reasoning": {"effort": "low"},
            "input": [{"role": "user", "content": [
                {"type": "input_text", "text": "What are the best foods to eat during pregnancy?"}
            ]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [
                {"type": "file_search_call", "status": "completed",
                 "queries": ["recommended foods during pregnancy"]},
                {"type": "message", "content": [{"type": "output_text", "text": kb_reply}]}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut state = SessionState::new();

    let answer = session
        .ask(&mut state, "What are the best foods to eat during pregnancy?")
        .await
        .unwrap();

    assert!(answer.contains("Source: knowledge base"));
    assert!(answer.contains("whole grains"));
    assert_eq!(state.events().for_turn(0).count(), 4);
}

#[tokio::test]
async fn test_feedback_ledger_reaches_instructions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("Keep responses to two sentences"))
        .and(body_string_contains("When asked about medical questions or emergency ONLY"))
        .respond_with(reply("Short answer. Source: knowledge base"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut ledger = antenatal_assistant::feedback::FeedbackLedger::new();
    ledger.append(antenatal_assistant::feedback::FeedbackEntry::new(
        "Keep responses to two sentences",
    ));
    let mut state = SessionState::with_ledger(ledger);

    let answer = session.ask(&mut state, "Is fish safe?").await.unwrap();
    assert_eq!(answer, "Short answer. Source: knowledge base");
}

#[tokio::test]
async fn test_out_of_scope_refusal_passes_through() {
    let mock_server = MockServer::start().await;
    let refusal = format!(
        "{} For advice on children's sleep, see the UNICEF Parenting website. Is there anything else I can help you with?",
        OUT_OF_SCOPE_REFUSAL
    );

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("outside the scope of antenatal nutritional care"))
        .respond_with(reply(&refusal))
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut state = SessionState::new();

    let answer = session
        .ask(&mut state, "How can I help my toddler sleep through the night?")
        .await
        .unwrap();

    assert!(answer.starts_with(OUT_OF_SCOPE_REFUSAL));
    assert!(!answer.contains("Source:"));
}

#[tokio::test]
async fn test_medical_redirection_passes_through() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(reply(MEDICAL_REDIRECTION))
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut state = SessionState::new();

    let answer = session
        .ask(&mut state, "I'm bleeding and have severe stomach pain")
        .await
        .unwrap();

    assert_eq!(answer, MEDICAL_REDIRECTION);
}

#[tokio::test]
async fn test_follow_up_replays_full_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_partial_json(json!({
            "input": [
                {"role": "user", "content": [{"type": "input_text", "text": "first"}]},
                {"role": "assistant", "content": [{"type": "output_text", "text": "one"}]},
                {"role": "user", "content": [{"type": "input_text", "text": "second"}]}
            ]
        })))
        .respond_with(reply("two"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(reply("one"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut state = SessionState::new();

    assert_eq!(session.ask(&mut state, "first").await.as_deref(), Some("one"));
    assert_eq!(session.ask(&mut state, "second").await.as_deref(), Some("two"));
    assert_eq!(state.transcript().len(), 4);
}

#[tokio::test]
async fn test_remote_failure_is_rendered_into_transcript() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}
        })))
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut state = SessionState::new();
    session.inject_reply(&mut state, "Welcome! Ask me about nutrition.");
    let ledger_before = state.ledger().len();

    let answer = session.ask(&mut state, "Can I drink coffee?").await.unwrap();

    assert_eq!(answer, "Error: API error: 429 - You exceeded your current quota");
    let transcript = state.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].text, "Welcome! Ask me about nutrition.");
    assert_eq!(transcript[2].role, Role::Assistant);
    assert_eq!(transcript[2].text, answer);
    assert_eq!(state.ledger().len(), ledger_before);
}

#[tokio::test]
async fn test_missing_api_key_fails_every_call() {
    let mut config = create_test_config("http://127.0.0.1:9");
    config.openai.api_key = None;

    let session = Session::from_config(&config).unwrap();
    let mut state = SessionState::new();

    let answer = session.ask(&mut state, "Hello").await.unwrap();
    assert!(answer.starts_with("Error: No OpenAI API key configured"));
}

#[tokio::test]
async fn test_feedback_submission_flow() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_partial_json(json!({
            "reasoning": {"effort": "minimal"},
            "text": {"verbosity": "low"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output_text": "  Keep responses concise; always respond in 2 sentences or less  "
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = Session::from_config(&create_test_config(&mock_server.uri())).unwrap();
    let mut state = SessionState::new();
    session.inject_reply(&mut state, "A very long reply about body image and nutrition.");

    let entry = session
        .submit_feedback(&mut state, "Respond in 2 sentences or less")
        .await
        .unwrap();

    assert_eq!(
        entry.text,
        "Keep responses concise; always respond in 2 sentences or less"
    );
    assert_eq!(state.ledger().len(), 2);
}

#[tokio::test]
async fn test_guardrail_screening_when_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("fact-checking assistant"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output_text": "{\"flagged\": true, \"confidence\": 0.95, \"hallucinated_statements\": [\"Papaya cures nausea\"]}"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(reply("Papaya cures nausea. Source: knowledge base"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.guardrails.enabled = true;

    let session = Session::from_config(&config).unwrap();
    let mut state = SessionState::new();

    let answer = session.ask(&mut state, "Does papaya help nausea?").await.unwrap();
    assert_eq!(answer, "Papaya cures nausea. Source: knowledge base");
}
