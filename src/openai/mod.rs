//! OpenAI Responses API client and wire types.
//!
//! The reasoning engine runs its own tool loop server-side (hosted file
//! search and web search), so one request yields the final reply plus the
//! items it produced along the way.

mod client;
mod types;


pub use client::OpenAiClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::EngineResult;

/// Anything that can answer a Responses request.
///
/// Implemented by [`OpenAiClient`]; tests substitute scripted engines.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Send one non-streaming request and return the full response
    async fn respond(&self, request: ResponsesRequest) -> EngineResult<ResponsesResponse>;
}
