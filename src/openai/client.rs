use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{ResponsesRequest, ResponsesResponse};
use super::ReasoningEngine;
use crate::config::{OpenAiConfig, RequestConfig};
use crate::error::{EngineError, EngineResult};

/// Client for the OpenAI Responses API
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    request_config: RequestConfig,
}

impl OpenAiClient {
    /// Create a new client. A missing API key is accepted; calls fail later.
    pub fn new(config: &OpenAiConfig, request_config: RequestConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(EngineError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Create a response, retrying transient failures when configured
    pub async fn create_response(
        &self,
        request: &ResponsesRequest,
    ) -> EngineResult<ResponsesResponse> {
        let api_key = self.api_key.as_deref().ok_or(EngineError::MissingApiKey)?;
        let url = format!("{}/v1/responses", self.base_url);

        let mut retries = 0;

        loop {
            if retries > 0 {
                let delay = backoff_delay(self.request_config.retry_delay_ms, retries);
                warn!(
                    model = %request.model,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying Responses API request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, api_key, request).await {
                Ok(response) => {
                    info!(
                        model = %request.model,
                        latency_ms = start.elapsed().as_millis(),
                        tool_calls = response.tool_call_count(),
                        "Responses API call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        model = %request.model,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Responses API call failed"
                    );

                    if !e.is_retryable() || retries >= self.request_config.max_retries {
                        if retries == 0 {
                            return Err(e);
                        }
                        return Err(EngineError::Unavailable {
                            message: e.to_string(),
                            retries,
                        });
                    }
                    retries += 1;
                }
            }
        }
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        api_key: &str,
        request: &ResponsesRequest,
    ) -> EngineResult<ResponsesResponse> {
        debug!(
            model = %request.model,
            input_items = request.input.len(),
            tools = request.tools.len(),
            "Calling Responses API"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    EngineError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                message: api_error_message(&error_body),
            });
        }

        response
            .json::<ResponsesResponse>()
            .await
            .map_err(|e| EngineError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ReasoningEngine for OpenAiClient {
    async fn respond(&self, request: ResponsesRequest) -> EngineResult<ResponsesResponse> {
        self.create_response(&request).await
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw body
/// Exponential delay before retry `retry` (1-based), saturating instead of overflowing
fn backoff_delay(base_ms: u64, retry: u32) -> Duration {
    let factor = 2_u64
        .checked_pow(retry.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
