// ABOUTME: OpenAI-compatible chat completions client used for chat replies and translation
// ABOUTME: Single-attempt POST to {base_url}/chat/completions with bearer auth and a request timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # `OpenAI`-Compatible Provider
//!
//! Talks to `OpenAI` itself by default; any endpoint implementing the chat
//! completions API (Azure deployments, vLLM, Ollama) works by changing
//! `LLM_BASE_URL`.

use std::time::Duration;

use async_trait::async_trait;
use karetek_core::constants::chat::DEFAULT_MODEL;
use karetek_core::errors::{AppError, ErrorCode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, TokenUsage};
use crate::config::LlmConfig;

/// Service label used in error messages and logs
const SERVICE_NAME: &str = "OpenAI";

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for OpenAiMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: String,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// Usage statistics in response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(rename = "prompt_tokens")]
    prompt: u32,
    #[serde(rename = "completion_tokens")]
    completion: u32,
    #[serde(rename = "total_tokens")]
    total: u32,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// API key; requests are sent unauthenticated when `None`
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_owned(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmConfig> for OpenAiCompatibleConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            default_model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Add authorization header if API key is configured
    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.bearer_auth(api_key)
        } else {
            request
        }
    }

    /// Parse error response from API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) else {
            return AppError::external_service(
                SERVICE_NAME,
                format!(
                    "API error ({status}): {}",
                    body.chars().take(200).collect::<String>()
                ),
            );
        };

        let detail = error_response.error;
        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("API authentication failed: {}", detail.message),
            ),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                Self::extract_rate_limit_message(&detail.message),
            ),
            503 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("{SERVICE_NAME} unavailable: {}", detail.message),
            ),
            _ => AppError::external_service(
                SERVICE_NAME,
                format!(
                    "{} - {}",
                    detail.error_type.as_deref().unwrap_or("unknown"),
                    detail.message
                ),
            ),
        }
    }

    /// Extract a user-friendly rate limit message from an `OpenAI` error
    fn extract_rate_limit_message(message: &str) -> String {
        const MARKER: &str = "try again in ";
        // ASCII lowercasing keeps byte offsets aligned with `message`
        let after_marker = message
            .to_ascii_lowercase()
            .find(MARKER)
            .and_then(|pos| message.get(pos + MARKER.len()..));
        if let Some(after_prefix) = after_marker {
            let end_pos = after_prefix
                .find(|c: char| !c.is_ascii_digit() && c != '.')
                .unwrap_or(after_prefix.len());
            if let Ok(seconds) = after_prefix[..end_pos].parse::<f64>() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let seconds_int = seconds.ceil() as u64;
                return format!("LLM rate limit reached. Please try again in {seconds_int} seconds.");
            }
        }
        "LLM rate limit reached. Please wait a moment and try again.".to_owned()
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let openai_request = OpenAiRequest {
            model,
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(
            "Sending chat completion request with {} messages",
            openai_request.messages.len()
        );

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .json(&openai_request);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to {SERVICE_NAME}: {e}");
                if e.is_timeout() {
                    AppError::new(
                        ErrorCode::ExternalServiceUnavailable,
                        format!("{SERVICE_NAME} request timed out"),
                    )
                } else {
                    AppError::external_service(SERVICE_NAME, format!("Failed to connect: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read API response: {e}");
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse API response: {e}");
            AppError::external_service(SERVICE_NAME, format!("Failed to parse response: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(ChatResponse {
            content,
            model: openai_response.model,
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt,
                completion_tokens: u.completion,
                total_tokens: u.total,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_request_serialization_skips_unset_fields() {
        let messages = vec![ChatMessage::system("persona"), ChatMessage::user("hello")];
        let request = OpenAiRequest {
            model: "gpt-4o-mini",
            messages: messages.iter().map(OpenAiMessage::from).collect(),
            temperature: Some(0.7),
            max_tokens: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], MessageRole::System.as_str());
        assert_eq!(json["messages"][1]["content"], "hello");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_rate_limit_message_extracts_seconds() {
        let msg = OpenAiCompatibleProvider::extract_rate_limit_message(
            "Rate limit reached. Please try again in 1.5s.",
        );
        assert_eq!(msg, "LLM rate limit reached. Please try again in 2 seconds.");
        let fallback = OpenAiCompatibleProvider::extract_rate_limit_message("slow down");
        assert!(fallback.contains("wait a moment"));
    }

    #[test]
    fn test_rate_limit_message_with_non_ascii_prefix() {
        // 'İ' grows by a byte under full Unicode lowercasing
        let fallback =
            OpenAiCompatibleProvider::extract_rate_limit_message("\u{130} try again in \u{e9}5");
        assert!(fallback.contains("wait a moment"));

        let msg = OpenAiCompatibleProvider::extract_rate_limit_message(
            "\u{130}stanbul org: Try again in 3s",
        );
        assert_eq!(msg, "LLM rate limit reached. Please try again in 3 seconds.");
    }

    #[test]
    fn test_error_response_mapping() {
        let body = r#"{"error":{"message":"bad key","type":"invalid_request_error"}}"#;
        let err = OpenAiCompatibleProvider::parse_error_response(StatusCode::UNAUTHORIZED, body);
        assert_eq!(err.code, ErrorCode::ExternalAuthFailed);

        let err = OpenAiCompatibleProvider::parse_error_response(
            StatusCode::BAD_GATEWAY,
            "<html>bad gateway</html>",
        );
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
    }

    #[test]
    fn test_config_from_llm_config() {
        let config = OpenAiCompatibleConfig::from(&LlmConfig {
            api_key: Some("sk-test".to_owned()),
            base_url: "http://localhost:8000/v1/".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            timeout_secs: 5,
        });
        let provider = OpenAiCompatibleProvider::new(config).unwrap();
        assert_eq!(
            provider.api_url("chat/completions"),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }
}
