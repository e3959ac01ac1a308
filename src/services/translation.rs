// ABOUTME: Stateless medical translation of consultation text through the LLM provider
// ABOUTME: Joins message contents, instructs a translator persona and returns plain text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::time::Instant;

use karetek_core::constants::chat::{TRANSLATE_MAX_TOKENS, TRANSLATE_TEMPERATURE};
use karetek_core::errors::{AppError, AppResult};
use karetek_core::language::Language;
use tracing::warn;

use crate::llm::prompts::translation_prompt;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::{elapsed_millis, AppLogger};

/// Public failure message for translations
pub const TRANSLATE_FAILURE_MESSAGE: &str = "Failed to translate";

/// Separator placed between message contents
const SEGMENT_SEPARATOR: &str = "\n\n";

/// Strict parse of a translation target.
///
/// # Errors
///
/// Returns `InvalidInput` when the code is missing or not a supported language
pub fn parse_target_language(code: Option<&str>) -> AppResult<Language> {
    let code = code.ok_or_else(|| AppError::invalid_input("targetLanguage is required"))?;
    Language::from_code(code)
        .ok_or_else(|| AppError::invalid_input(format!("Unsupported target language: {code}")))
}

/// Translate `texts` into `target`.
///
/// Business rules:
/// - Texts are joined with a blank line and sent as one user message
/// - One LLM attempt at low temperature; nothing is persisted
///
/// # Errors
///
/// Returns `InvalidInput` for an empty list and `InternalError` with
/// [`TRANSLATE_FAILURE_MESSAGE`] when the LLM call fails
pub async fn translate(
    llm: &dyn LlmProvider,
    target: Language,
    texts: &[String],
) -> AppResult<String> {
    if texts.is_empty() {
        return Err(AppError::invalid_input("Messages array is required"));
    }

    let request = ChatRequest::new(vec![
        ChatMessage::system(translation_prompt(target)),
        ChatMessage::user(texts.join(SEGMENT_SEPARATOR)),
    ])
    .with_temperature(TRANSLATE_TEMPERATURE)
    .with_max_tokens(TRANSLATE_MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_upstream_call(
        llm.name(),
        "translation",
        result.is_ok(),
        elapsed_millis(started),
    );
    let response = result.map_err(|e| {
        warn!(provider = llm.name(), target = %target, "Translation failed: {e}");
        AppError::internal(TRANSLATE_FAILURE_MESSAGE)
    })?;

    Ok(response.content.trim().to_owned())
}
