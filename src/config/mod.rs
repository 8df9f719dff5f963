use std::env;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub agent: AgentConfig,
    pub feedback: FeedbackConfig,
    pub guardrails: GuardrailConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
}

/// OpenAI API configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Missing keys are tolerated at startup; every remote call fails later.
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Answer-resolution agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub vector_store_id: String,
    pub workflow_id: String,
    pub search_context_size: SearchContextSize,
}

/// Feedback summarizer configuration
#[derive(Debug, Clone)]
pub struct FeedbackConfig {
    pub model: String,
}

/// Hallucination guardrail configuration
#[derive(Debug, Clone)]
pub struct GuardrailConfig {
    pub enabled: bool,
    pub model: String,
    pub confidence_threshold: f64,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// How much web context the hosted search tool may pull in
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    Low,
    Medium,
    High,
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_VECTOR_STORE_ID: &str = "vs_68e564ee284c8191b710c92f0d4fa2fa";
pub const DEFAULT_WORKFLOW_ID: &str = "wf_68e56f12bcf48190b7e91a99078486660c0761352f75c07b";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let openai = OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };

        let search_context_size = match env::var("WEB_SEARCH_CONTEXT_SIZE") {
            Ok(value) => SearchContextSize::parse(&value).ok_or_else(|| AppError::Config {
                message: format!(
                    "WEB_SEARCH_CONTEXT_SIZE must be low, medium or high (got '{}')",
                    value
                ),
            })?,
            Err(_) => SearchContextSize::Medium,
        };

        let agent = AgentConfig {
            model: env::var("AGENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            vector_store_id: env::var("KNOWLEDGE_VECTOR_STORE_ID")
                .unwrap_or_else(|_| DEFAULT_VECTOR_STORE_ID.to_string()),
            workflow_id: env::var("WORKFLOW_ID").unwrap_or_else(|_| DEFAULT_WORKFLOW_ID.to_string()),
            search_context_size,
        };

        let feedback = FeedbackConfig {
            model: env::var("FEEDBACK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        };

        let guardrails = GuardrailConfig {
            enabled: env::var("GUARDRAILS_ENABLED")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            model: env::var("GUARDRAIL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            confidence_threshold: env::var("GUARDRAIL_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.8),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        Ok(Config {
            openai,
            agent,
            feedback,
            guardrails,
            logging,
            request,
        })
    }

    /// Whether a credential for the reasoning service was found
    pub fn has_api_key(&self) -> bool {
        self.openai.api_key.is_some()
    }
}

impl SearchContextSize {
    /// Parse a case-insensitive size name
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_retries: 0,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            vector_store_id: DEFAULT_VECTOR_STORE_ID.to_string(),
            workflow_id: DEFAULT_WORKFLOW_ID.to_string(),
            search_context_size: SearchContextSize::Medium,
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: DEFAULT_MODEL.to_string(),
            confidence_threshold: 0.8,
        }
    }
}
