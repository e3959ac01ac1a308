// ABOUTME: Text-to-speech abstraction used by the avatar endpoint
// ABOUTME: Defines the provider contract and the language-to-voice table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Speech Synthesis
//!
//! The avatar handler picks a voice with [`voice_for`] and asks the injected
//! [`SpeechProvider`] for MP3 bytes. Production uses [`ElevenLabsProvider`].

mod elevenlabs;

pub use elevenlabs::{ElevenLabsConfig, ElevenLabsProvider};

use async_trait::async_trait;
use bytes::Bytes;
use karetek_core::errors::AppError;
use karetek_core::language::Language;

/// Multilingual voice used for English and Urdu
pub const VOICE_RACHEL: &str = "21m00Tcm4TlvDq8ikWAM";

/// Multilingual voice used for the remaining languages
pub const VOICE_BELLA: &str = "EXAVITQu4vr4xnSDxMaL";

/// Voice ID for a consultation language
#[must_use]
pub const fn voice_for(language: Language) -> &'static str {
    match language {
        Language::En | Language::Ur => VOICE_RACHEL,
        Language::Ar | Language::Fr | Language::Es | Language::De | Language::Zh => VOICE_BELLA,
    }
}

/// Text-to-speech provider
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Unique provider identifier
    fn name(&self) -> &'static str;

    /// Synthesize `text` with `voice_id`, returning MP3 audio
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_table() {
        assert_eq!(voice_for(Language::En), VOICE_RACHEL);
        assert_eq!(voice_for(Language::Ur), VOICE_RACHEL);
        for lang in [Language::Ar, Language::Fr, Language::Es, Language::De, Language::Zh] {
            assert_eq!(voice_for(lang), VOICE_BELLA);
        }
    }
}
