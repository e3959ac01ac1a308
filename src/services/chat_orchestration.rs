// ABOUTME: Chat turn orchestration: validate turns, assemble context, call the LLM, persist the session
// ABOUTME: Persistence is best-effort and only happens for authenticated callers with a session id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::time::Instant;

use karetek_core::constants::chat::{CHAT_MAX_TOKENS, CHAT_TEMPERATURE};
use karetek_core::errors::{AppError, AppResult};
use karetek_core::language::Language;
use karetek_core::models::{ChatTurn, TurnRole};
use serde::Deserialize;
use tracing::{info, warn};

use crate::database::ConsultationManager;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::{elapsed_millis, AppLogger};
use crate::middleware::RequestIdentity;
use crate::services::context_assembler::ContextAssembler;

/// Public failure message for chat turns
pub const CHAT_FAILURE_MESSAGE: &str = "Failed to process chat request";

/// A turn as sent by the client, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingTurn {
    /// `user` or `assistant`
    pub role: Option<String>,
    /// Message text
    pub content: Option<String>,
}

/// Validated input for one chat turn
#[derive(Debug, Clone)]
pub struct ChatTurnInput {
    /// Conversation so far, ending with the newest user turn
    pub turns: Vec<ChatTurn>,
    /// Consultation language
    pub language: Language,
    /// Client session id; persistence requires it
    pub session_id: Option<String>,
}

/// Result of a chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnOutcome {
    /// Assistant reply
    pub message: String,
    /// Whether the consultation was stored
    pub saved: bool,
}

/// Validate the client's turn list.
///
/// Business rules:
/// - The list must be present and non-empty
/// - Every role must be `user` or `assistant`; system turns are never accepted
/// - Every turn must carry content
///
/// # Errors
///
/// Returns `InvalidInput` describing the first violation
pub fn validate_turns(messages: Option<Vec<IncomingTurn>>) -> AppResult<Vec<ChatTurn>> {
    let messages = messages.unwrap_or_default();
    if messages.is_empty() {
        return Err(AppError::invalid_input("Messages array is required"));
    }

    messages
        .into_iter()
        .enumerate()
        .map(|(index, turn)| {
            let role = turn
                .role
                .as_deref()
                .and_then(TurnRole::parse)
                .ok_or_else(|| {
                    AppError::invalid_input(format!(
                        "messages[{index}].role must be 'user' or 'assistant'"
                    ))
                })?;
            let content = turn.content.ok_or_else(|| {
                AppError::invalid_input(format!("messages[{index}].content is required"))
            })?;
            Ok(ChatTurn { role, content })
        })
        .collect()
}

/// Run one chat turn end to end.
///
/// Business rules:
/// - The system prompt is assembled per turn and never stored
/// - One LLM attempt; failure surfaces as a generic 500
/// - The consultation is upserted only for authenticated callers with a
///   session id; a failed save is logged and reported as `saved: false`
///
/// # Errors
///
/// Returns `InternalError` with [`CHAT_FAILURE_MESSAGE`] if the LLM call fails
pub async fn run_chat_turn(
    llm: &dyn LlmProvider,
    assembler: &ContextAssembler,
    consultations: &ConsultationManager,
    identity: &RequestIdentity,
    input: ChatTurnInput,
) -> AppResult<ChatTurnOutcome> {
    let system_prompt = assembler.assemble(input.language, identity).await;

    let mut messages = Vec::with_capacity(input.turns.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(input.turns.iter().map(ChatMessage::from));

    let request = ChatRequest::new(messages)
        .with_temperature(CHAT_TEMPERATURE)
        .with_max_tokens(CHAT_MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_upstream_call(
        llm.name(),
        "chat_completion",
        result.is_ok(),
        elapsed_millis(started),
    );
    let reply = result.map_err(|e| {
        warn!(provider = llm.name(), "Chat completion failed: {e}");
        AppError::internal(CHAT_FAILURE_MESSAGE)
    })?;

    let saved = match (identity.user(), input.session_id.as_deref()) {
        (Some(user), Some(session_id)) if !session_id.trim().is_empty() => {
            let mut stored = input.turns;
            stored.push(ChatTurn::assistant(reply.content.clone()));
            save_consultation(consultations, &user.user_id, session_id, input.language, &stored)
                .await
        }
        _ => false,
    };

    Ok(ChatTurnOutcome {
        message: reply.content,
        saved,
    })
}

async fn save_consultation(
    consultations: &ConsultationManager,
    user_id: &str,
    session_id: &str,
    language: Language,
    turns: &[ChatTurn],
) -> bool {
    match consultations
        .upsert(user_id, session_id, language.code(), turns)
        .await
    {
        Ok(outcome) if outcome.is_written() => {
            info!(user_id, session_id, turns = turns.len(), "Consultation saved");
            true
        }
        Ok(_) => {
            warn!(user_id, session_id, "Session id belongs to another user, consultation not saved");
            false
        }
        Err(e) => {
            warn!(user_id, session_id, "Failed to save consultation: {e}");
            false
        }
    }
}
