use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Feedback(#[from] FeedbackError),
}

/// Reasoning engine (OpenAI Responses API) errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No OpenAI API key configured; set OPENAI_API_KEY in the environment or .env")]
    MissingApiKey,

    #[error("Reasoning engine unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Reasoning engine returned no text output")]
    EmptyOutput,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Feedback submission errors
///
/// The first two are caller-side precondition failures surfaced as
/// blocking warnings; they never reach the summarizer.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback requires at least one assistant response to review.")]
    NoAssistantMessage,

    #[error("Please provide clinician notes before submitting feedback.")]
    EmptyNotes,

    #[error("Feedback generation failed: {0}")]
    Summarizer(EngineError),
}

impl EngineError {
    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Timeout { .. } | EngineError::Http(_) => true,
            EngineError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for reasoning engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for feedback operations
pub type FeedbackResult<T> = Result<T, FeedbackError>;
