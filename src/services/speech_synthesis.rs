// ABOUTME: Avatar speech pipeline: pick language and voice, synthesize audio, upload it
// ABOUTME: Romanized Urdu/Arabic text is returned as text-only without calling the TTS provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::time::Instant;

use chrono::Utc;
use karetek_core::errors::{AppError, AppResult};
use karetek_core::language::{contains_arabic_script, detect_language, Language};
use tracing::info;

use crate::logging::{elapsed_millis, AppLogger};
use crate::speech::{voice_for, SpeechProvider};
use crate::storage::{ObjectStorage, ObjectUpload};

/// MIME type of synthesized audio
const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Browser cache lifetime for audio objects
const AUDIO_CACHE_SECS: u32 = 3600;

/// What the avatar should do with a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Audio was synthesized and uploaded
    Spoken {
        /// Public URL of the MP3
        audio_url: String,
        /// Language the audio was spoken in
        language: Language,
    },
    /// The text is romanized Urdu/Arabic and should only be displayed
    TextOnly,
}

/// Language for `text`: the requested code when supported, otherwise detected
#[must_use]
pub fn resolve_language(text: &str, requested: Option<&str>) -> Language {
    requested
        .and_then(Language::from_code)
        .unwrap_or_else(|| detect_language(text))
}

/// Speak `text` through the avatar.
///
/// Business rules:
/// - Blank text is rejected before anything else
/// - Urdu or Arabic without any Arabic-script character is text-only
/// - Audio is uploaded under `audio/{unix_millis}-{lang}.mp3` and never overwritten
///
/// # Errors
///
/// Returns `InvalidInput` for blank text, or the provider/storage error
pub async fn speak(
    speech: &dyn SpeechProvider,
    storage: &dyn ObjectStorage,
    text: &str,
    requested_language: Option<&str>,
) -> AppResult<SpeechOutcome> {
    if text.trim().is_empty() {
        return Err(AppError::invalid_input("Text is required"));
    }

    let language = resolve_language(text, requested_language);
    if language.uses_arabic_script() && !contains_arabic_script(text) {
        info!(language = %language, "Roman script text, skipping speech synthesis");
        return Ok(SpeechOutcome::TextOnly);
    }

    let started = Instant::now();
    let audio = speech.synthesize(text, voice_for(language)).await;
    AppLogger::log_upstream_call(
        speech.name(),
        "synthesize",
        audio.is_ok(),
        elapsed_millis(started),
    );
    let audio = audio?;
    let key = format!("audio/{}-{}.mp3", Utc::now().timestamp_millis(), language.code());
    let audio_url = storage
        .put(ObjectUpload {
            key,
            bytes: audio,
            content_type: AUDIO_CONTENT_TYPE,
            cache_control_secs: AUDIO_CACHE_SECS,
        })
        .await?;

    Ok(SpeechOutcome::Spoken {
        audio_url,
        language,
    })
}
