// ABOUTME: ElevenLabs text-to-speech client returning MP3 audio bytes
// ABOUTME: Single-attempt POST to {base_url}/text-to-speech/{voice_id} with fixed voice settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use karetek_core::errors::{AppError, ErrorCode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::SpeechProvider;
use crate::config::SpeechConfig;

const SERVICE_NAME: &str = "ElevenLabs";

/// Multilingual low-latency model
const MODEL_ID: &str = "eleven_turbo_v2_5";

/// Highest latency optimisation level the API accepts
const OPTIMIZE_STREAMING_LATENCY: u8 = 4;

/// 44.1 kHz, 128 kbps MP3
const OUTPUT_FORMAT: &str = "mp3_44100_128";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Voice tuning sent with every request
#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
    style: f64,
    use_speaker_boost: bool,
}

const VOICE_SETTINGS: VoiceSettings = VoiceSettings {
    stability: 0.71,
    similarity_boost: 0.5,
    style: 0.0,
    use_speaker_boost: true,
};

#[derive(Debug, Serialize)]
struct TextToSpeechRequest<'a> {
    text: &'a str,
    model_id: &'static str,
    voice_settings: VoiceSettings,
}

/// `{"detail": {"status": "...", "message": "..."}}` or `{"detail": "..."}`
#[derive(Debug, Deserialize)]
struct ElevenLabsError {
    detail: serde_json::Value,
}

impl ElevenLabsError {
    fn message(&self) -> String {
        self.detail
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| self.detail.to_string(), ToOwned::to_owned)
    }
}

/// Configuration for the `ElevenLabs` client
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    /// Base URL (e.g., <https://api.elevenlabs.io/v1>)
    pub base_url: String,
    /// API key sent as `xi-api-key`
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl From<&SpeechConfig> for ElevenLabsConfig {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// `ElevenLabs` text-to-speech provider
pub struct ElevenLabsProvider {
    client: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsProvider {
    /// Create a new provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ElevenLabsConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn synthesis_url(&self, voice_id: &str) -> String {
        format!(
            "{}/text-to-speech/{}?optimize_streaming_latency={OPTIMIZE_STREAMING_LATENCY}&output_format={OUTPUT_FORMAT}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(voice_id)
        )
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let message = serde_json::from_str::<ElevenLabsError>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |e| e.message(),
        );
        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{SERVICE_NAME} authentication failed: {message}"),
            ),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("{SERVICE_NAME} rate limit reached: {message}"),
            ),
            _ => AppError::external_service(SERVICE_NAME, format!("API error ({status}): {message}")),
        }
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    #[instrument(skip(self, text), fields(voice_id = %voice_id, text_len = text.len()))]
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, AppError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AppError::config(format!("{SERVICE_NAME} API key is not configured"))
        })?;

        let body = TextToSpeechRequest {
            text,
            model_id: MODEL_ID,
            voice_settings: VOICE_SETTINGS,
        };

        let response = self
            .client
            .post(self.synthesis_url(voice_id))
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to {SERVICE_NAME}: {e}");
                AppError::external_service(SERVICE_NAME, format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let audio = response.bytes().await.map_err(|e| {
            error!("Failed to read {SERVICE_NAME} audio: {e}");
            AppError::external_service(SERVICE_NAME, format!("Failed to read audio: {e}"))
        })?;
        debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
