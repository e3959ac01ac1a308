// ABOUTME: Persona and translation system prompts loaded at compile time
// ABOUTME: English and Urdu personas ship as markdown; other languages reuse English with a reply-language line
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

use karetek_core::language::Language;

/// Karetek assistant persona in English
pub const KARETEK_PERSONA_EN: &str = include_str!("karetek_en.md");

/// Karetek assistant persona in Urdu
pub const KARETEK_PERSONA_UR: &str = include_str!("karetek_ur.md");

/// Persona system prompt for a consultation held in `language`
#[must_use]
pub fn persona_prompt(language: Language) -> String {
    match language {
        Language::En => KARETEK_PERSONA_EN.trim_end().to_owned(),
        Language::Ur => KARETEK_PERSONA_UR.trim_end().to_owned(),
        other => format!(
            "{}\n\nAlways respond in {}.",
            KARETEK_PERSONA_EN.trim_end(),
            other.display_name()
        ),
    }
}

/// System prompt instructing the model to translate into `target`
#[must_use]
pub fn translation_prompt(target: Language) -> String {
    format!(
        "You are a professional medical translator. Translate the following text to {} while \
         maintaining medical accuracy. Return ONLY the translated text, nothing else. Do not \
         include role labels or formatting.",
        target.display_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_personas() {
        assert!(persona_prompt(Language::En).starts_with("You are Karetek"));
        assert!(persona_prompt(Language::Ur).contains("Karetek"));
        assert!(!persona_prompt(Language::En).ends_with('\n'));
    }

    #[test]
    fn test_other_languages_get_reply_instruction() {
        let prompt = persona_prompt(Language::Fr);
        assert!(prompt.starts_with("You are Karetek"));
        assert!(prompt.ends_with("Always respond in French."));
    }

    #[test]
    fn test_translation_prompt_names_language() {
        assert_eq!(
            translation_prompt(Language::Ur),
            "You are a professional medical translator. Translate the following text to Urdu \
             while maintaining medical accuracy. Return ONLY the translated text, nothing else. \
             Do not include role labels or formatting."
        );
    }
}
