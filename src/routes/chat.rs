// ABOUTME: Chat route handlers for AI consultation turns and medical translation
// ABOUTME: Chat accepts anonymous callers; only signed-in callers with a session id are persisted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Chat routes
//!
//! - `POST /api/chat`: one assistant turn over the client's full history
//! - `POST /api/chat/translate`: stateless translation of message contents

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use karetek_core::errors::AppError;
use karetek_core::language::Language;
use serde::{Deserialize, Serialize};

use crate::resources::ServerResources;
use crate::routes::{non_blank, ApiJson};
use crate::services::chat_orchestration::{
    run_chat_turn, validate_turns, ChatTurnInput, IncomingTurn,
};
use crate::services::translation::{parse_target_language, translate};

/// Body of `POST /api/chat`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation so far, newest user turn last
    pub messages: Option<Vec<IncomingTurn>>,
    /// Consultation language code; unknown codes fall back to English
    pub language: Option<String>,
    /// Client-generated session id
    pub session_id: Option<String>,
}

/// Response of `POST /api/chat`
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Assistant reply
    pub message: String,
    /// Whether the consultation was stored
    pub saved: bool,
}

/// Body of `POST /api/chat/translate`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    /// Messages whose contents are translated; roles are ignored
    pub messages: Option<Vec<IncomingTurn>>,
    /// Target language code
    pub target_language: Option<String>,
}

/// Response of `POST /api/chat/translate`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    /// Translated text
    pub translated_text: String,
}

/// Chat routes
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::handle_chat))
            .route("/api/chat/translate", post(Self::handle_translate))
            .with_state(resources)
    }

    /// Run one chat turn
    async fn handle_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<ChatRequest>,
    ) -> Result<Response, AppError> {
        let turns = validate_turns(request.messages)?;
        let identity = resources.auth_middleware.identify_headers(&headers);

        let input = ChatTurnInput {
            turns,
            language: Language::from_code_or_default(request.language.as_deref()),
            session_id: non_blank(request.session_id),
        };
        let outcome = run_chat_turn(
            resources.llm.as_ref(),
            &resources.context_assembler,
            &resources.database.consultations(),
            &identity,
            input,
        )
        .await?;

        Ok((
            StatusCode::OK,
            Json(ChatResponse {
                message: outcome.message,
                saved: outcome.saved,
            }),
        )
            .into_response())
    }

    /// Translate message contents into the target language
    async fn handle_translate(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(request): ApiJson<TranslateRequest>,
    ) -> Result<Response, AppError> {
        let messages = request
            .messages
            .filter(|m| !m.is_empty())
            .ok_or_else(|| AppError::invalid_input("Messages array is required"))?;
        let target = parse_target_language(request.target_language.as_deref())?;

        let texts = messages
            .into_iter()
            .enumerate()
            .map(|(index, message)| {
                message.content.ok_or_else(|| {
                    AppError::invalid_input(format!("messages[{index}].content is required"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let translated_text = translate(resources.llm.as_ref(), target, &texts).await?;
        Ok((StatusCode::OK, Json(TranslateResponse { translated_text })).into_response())
    }
}
