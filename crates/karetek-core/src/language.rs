// ABOUTME: Supported conversation languages and script-based language auto-detection
// ABOUTME: Pure Unicode range heuristics used by chat, translation and the speech avatar
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Languages
//!
//! The assistant speaks a fixed set of languages. Codes arriving from clients are
//! parsed either leniently ([`Language::from_code_or_default`], used by chat where an
//! unknown code falls back to English) or strictly ([`Language::from_code`], used
//! by translation where an unknown target is a client error).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Languages the assistant can converse, translate and speak in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    En,
    /// Urdu
    Ur,
    /// Arabic
    Ar,
    /// French
    Fr,
    /// Spanish
    Es,
    /// German
    De,
    /// Chinese
    Zh,
}

impl Language {
    /// Every supported language, in display order
    pub const ALL: [Self; 7] = [
        Self::En,
        Self::Ur,
        Self::Ar,
        Self::Fr,
        Self::Es,
        Self::De,
        Self::Zh,
    ];

    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ur => "ur",
            Self::Ar => "ar",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::De => "de",
            Self::Zh => "zh",
        }
    }

    /// English display name, used inside prompts
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ur => "Urdu",
            Self::Ar => "Arabic",
            Self::Fr => "French",
            Self::Es => "Spanish",
            Self::De => "German",
            Self::Zh => "Chinese",
        }
    }

    /// Name of the language in its own script
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ur => "اردو",
            Self::Ar => "العربية",
            Self::Fr => "Français",
            Self::Es => "Español",
            Self::De => "Deutsch",
            Self::Zh => "中文",
        }
    }

    /// Whether the language is normally written in the Arabic script block
    #[must_use]
    pub const fn uses_arabic_script(self) -> bool {
        matches!(self, Self::Ur | Self::Ar)
    }

    /// Strict parse of a language code (case-insensitive, surrounding whitespace ignored)
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// Lenient parse: unknown or missing codes become English
    #[must_use]
    pub fn from_code_or_default(code: Option<&str>) -> Self {
        code.and_then(Self::from_code).unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Script detection
// ============================================================================

const FRENCH_MARKS: &str = "àâäæçéèêëïîôùûüÿœÀÂÄÆÇÉÈÊËÏÎÔÙÛÜŸŒ";
const SPANISH_MARKS: &str = "áéíóúñü¿¡ÁÉÍÓÚÑÜ";
const GERMAN_MARKS: &str = "äöüßÄÖÜ";

const URDU_LETTERS: [char; 11] = [
    '\u{0679}', // ٹ
    '\u{067E}', // پ
    '\u{0686}', // چ
    '\u{0688}', // ڈ
    '\u{0691}', // ڑ
    '\u{0698}', // ژ
    '\u{06A9}', // ک
    '\u{06AF}', // گ
    '\u{06BA}', // ں
    '\u{06BE}', // ھ
    '\u{06CC}', // ی
];

/// True when `c` lies in the Arabic Unicode block (U+0600..=U+06FF)
#[must_use]
pub const fn is_arabic_block(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}')
}

const fn is_core_arabic_letter(c: char) -> bool {
    matches!(c, '\u{0621}'..='\u{063A}' | '\u{0641}'..='\u{064A}')
}

const fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}')
}

/// True when the text contains at least one Arabic-block code point
#[must_use]
pub fn contains_arabic_script(text: &str) -> bool {
    text.chars().any(is_arabic_block)
}

/// Detect the language of `text` from the scripts and diacritics it uses
///
/// Checks run in priority order: Arabic block (split into Urdu or Arabic by
/// counting Urdu-only letters against core Arabic letters), CJK ideographs,
/// then French, Spanish and German diacritics. Anything else is English.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    if contains_arabic_script(text) {
        let (arabic, urdu) = text.chars().fold((0_usize, 0_usize), |(a, u), c| {
            if URDU_LETTERS.contains(&c) {
                (a, u + 1)
            } else if is_core_arabic_letter(c) {
                (a + 1, u)
            } else {
                (a, u)
            }
        });
        return if urdu > arabic {
            Language::Ur
        } else {
            Language::Ar
        };
    }

    if text.chars().any(is_cjk) {
        return Language::Zh;
    }

    let has_any = |marks: &str| text.chars().any(|c| marks.contains(c));
    if has_any(FRENCH_MARKS) {
        Language::Fr
    } else if has_any(SPANISH_MARKS) {
        Language::Es
    } else if has_any(GERMAN_MARKS) {
        Language::De
    } else {
        Language::En
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urdu_majority_is_urdu() {
        // "آپ کیسے ہیں" contains پ, ک, ی, ی, ں
        assert_eq!(detect_language("آپ کیسے ہیں"), Language::Ur);
        assert_eq!(detect_language("\u{067E}\u{06A9}\u{06CC}"), Language::Ur);
    }

    #[test]
    fn test_arabic_only_letters_is_arabic() {
        assert_eq!(detect_language("مرحبا بكم"), Language::Ar);
        assert_eq!(detect_language("\u{0628}\u{062A}"), Language::Ar);
    }

    #[test]
    fn test_urdu_arabic_tie_is_arabic() {
        assert_eq!(detect_language("\u{067E}\u{0628}"), Language::Ar);
    }

    #[test]
    fn test_other_scripts() {
        assert_eq!(detect_language("你好"), Language::Zh);
        assert_eq!(detect_language("J'ai mal à la tête"), Language::Fr);
        assert_eq!(detect_language("¿Dónde está?"), Language::Es);
        assert_eq!(detect_language("Größe"), Language::De);
    }

    #[test]
    fn test_french_wins_over_shared_marks() {
        // é belongs to both French and Spanish sets; French is checked first
        assert_eq!(detect_language("café"), Language::Fr);
        // ü belongs to all three sets
        assert_eq!(detect_language("über"), Language::Fr);
    }

    #[test]
    fn test_unmatched_script_is_english() {
        assert_eq!(detect_language("I have a headache"), Language::En);
        assert_eq!(detect_language(""), Language::En);
        assert_eq!(detect_language("Здравствуйте"), Language::En);
    }

    #[test]
    fn test_code_parsing() {
        assert_eq!(Language::from_code("UR"), Some(Language::Ur));
        assert_eq!(Language::from_code(" zh "), Some(Language::Zh));
        assert_eq!(Language::from_code("xx"), None);
        assert_eq!(Language::from_code_or_default(Some("xx")), Language::En);
        assert_eq!(Language::from_code_or_default(None), Language::En);
    }
}
