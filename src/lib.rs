//! # Antenatal Assistant
//!
//! A conversational front-end for antenatal and postpartum nutrition
//! questions. Replies are resolved by a hosted reasoning engine under a
//! fixed policy: knowledge-base match first, then inference from the
//! knowledge base, then authoritative web sources, with fixed refusals for
//! out-of-scope and medical questions. Clinician feedback accumulates in a
//! per-session ledger that shapes every later reply.
//!
//! ## Architecture
//!
//! ```text
//! Console → Session → AnswerOrchestrator → OpenAI Responses API
//!              │            (file_search + web_search_preview)
//!              └──→ FeedbackSummarizer → OpenAI Responses API
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use antenatal_assistant::{Config, Session, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let session = Session::from_config(&config)?;
//!     let mut state = SessionState::new();
//!     let reply = session.ask(&mut state, "What should I eat in my first trimester?").await;
//!     println!("{}", reply.unwrap_or_default());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration loaded from the environment.
pub mod config;
/// Interactive terminal loop.
pub mod console;
/// Conversation turns, history normalization and turn events.
pub mod conversation;
/// Error types and result aliases.
pub mod error;
/// Clinician feedback ledger and summarizer.
pub mod feedback;
/// Guardrail verdicts and hallucination screening.
pub mod guardrails;
/// OpenAI Responses API client and types.
pub mod openai;
/// Instruction document assembly.
pub mod policy;
/// Prompt text.
pub mod prompts;
/// Session state and event handlers.
pub mod session;
/// Answer orchestration.
pub mod workflow;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::{Session, SessionState};
pub use workflow::{AnswerOrchestrator, WorkflowInput, WorkflowResult};
