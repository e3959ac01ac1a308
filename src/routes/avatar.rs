// ABOUTME: Avatar route handlers for text-to-speech, language detection and the language list
// ABOUTME: Speak responses keep the {success, ...} envelope the avatar client expects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use karetek_core::errors::AppError;
use karetek_core::language::{detect_language, Language};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::resources::ServerResources;
use crate::routes::ApiJson;
use crate::services::speech_synthesis::{speak, SpeechOutcome};

const ROMAN_SCRIPT_MESSAGE: &str = "Roman script - text display only";

/// Body of `POST /api/avatar/speak`
#[derive(Debug, Default, Deserialize)]
pub struct SpeakRequest {
    /// Text to speak
    pub text: Option<String>,
    /// Language code; detected from the text when absent or unsupported
    pub language: Option<String>,
}

/// Body of `POST /api/avatar/detect-language`
#[derive(Debug, Default, Deserialize)]
pub struct DetectLanguageRequest {
    /// Text to classify
    pub text: Option<String>,
}

/// One entry of `GET /api/avatar/languages`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    /// ISO 639-1 code
    pub code: &'static str,
    /// English name
    pub name: &'static str,
    /// Name in the language itself
    pub native_name: &'static str,
}

impl From<Language> for LanguageInfo {
    fn from(language: Language) -> Self {
        Self {
            code: language.code(),
            name: language.display_name(),
            native_name: language.native_name(),
        }
    }
}

/// Render a speech failure in the avatar envelope
fn failure_response(error: &AppError) -> Response {
    let status = if error.code.is_client_visible() {
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::BAD_REQUEST)
    } else {
        warn!(code = ?error.code, "Avatar speech failed: {error}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(json!({ "success": false, "error": error.public_message() })),
    )
        .into_response()
}

/// Avatar routes
pub struct AvatarRoutes;

impl AvatarRoutes {
    /// Create all avatar routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/avatar/speak", post(Self::handle_speak))
            .route("/api/avatar/detect-language", post(Self::handle_detect_language))
            .route("/api/avatar/languages", get(Self::handle_languages))
            .with_state(resources)
    }

    /// Synthesize speech for the avatar
    async fn handle_speak(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<ApiJson<SpeakRequest>, AppError>,
    ) -> Response {
        let request = match payload {
            Ok(ApiJson(request)) => request,
            Err(e) => return failure_response(&e),
        };
        let text = request.text.unwrap_or_default();

        match speak(
            resources.speech.as_ref(),
            resources.storage.as_ref(),
            &text,
            request.language.as_deref(),
        )
        .await
        {
            Ok(SpeechOutcome::Spoken {
                audio_url,
                language,
            }) => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "audioUrl": audio_url,
                    "language": language.code(),
                })),
            )
                .into_response(),
            Ok(SpeechOutcome::TextOnly) => (
                StatusCode::OK,
                Json(json!({
                    "success": false,
                    "textOnly": true,
                    "message": ROMAN_SCRIPT_MESSAGE,
                })),
            )
                .into_response(),
            Err(e) => failure_response(&e),
        }
    }

    /// Detect the language of a text
    async fn handle_detect_language(
        ApiJson(request): ApiJson<DetectLanguageRequest>,
    ) -> Result<Response, AppError> {
        let text = request
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input("Text is required"))?;

        Ok((
            StatusCode::OK,
            Json(json!({ "language": detect_language(&text).code() })),
        )
            .into_response())
    }

    /// List the supported languages
    async fn handle_languages() -> Response {
        let languages: Vec<LanguageInfo> =
            Language::ALL.into_iter().map(LanguageInfo::from).collect();
        (StatusCode::OK, Json(json!({ "languages": languages }))).into_response()
    }
}
