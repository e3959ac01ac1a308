// ABOUTME: HTTP integration tests for the avatar speech, language detection and language list routes
// ABOUTME: Verifies the romanized-text guard, voice selection, upload keys and the failure envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{MockLlm, MockSpeech};
use helpers::axum_test::AxumTestRequest;
use karetek_server::speech::{VOICE_BELLA, VOICE_RACHEL};
use serde_json::{json, Value};

// ============================================================================
// POST /api/avatar/speak
// ============================================================================

#[tokio::test]
async fn test_speak_english_uploads_audio() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "Please drink water", "language": "en" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "en");

    let uploads = app.storage.uploads();
    assert_eq!(uploads.len(), 1);
    let key = &uploads[0].key;
    assert!(key.starts_with("audio/"));
    assert!(key.ends_with("-en.mp3"));
    let millis = key
        .trim_start_matches("audio/")
        .trim_end_matches("-en.mp3");
    assert!(millis.parse::<i64>().is_ok());
    assert_eq!(uploads[0].content_type, "audio/mpeg");
    assert_eq!(
        body["audioUrl"],
        format!("https://cdn.test/avatar-audio/{key}")
    );
    assert_eq!(app.speech.voices(), vec![VOICE_RACHEL.to_owned()]);
}

#[tokio::test]
async fn test_speak_detects_language_when_absent() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "Bonjour, comment ça va?" }))
        .send(app.router())
        .await;

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "fr");
    assert_eq!(app.speech.voices(), vec![VOICE_BELLA.to_owned()]);
}

#[tokio::test]
async fn test_speak_unsupported_code_falls_back_to_detection() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "Wie geht es Ihnen? Schön.", "language": "xx" }))
        .send(app.router())
        .await;

    let body: Value = response.json();
    assert_eq!(body["language"], "de");
}

#[tokio::test]
async fn test_speak_roman_urdu_is_text_only_without_tts_call() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "Aap kaise hain", "language": "ur" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["textOnly"], true);
    assert_eq!(body["message"], "Roman script - text display only");
    assert_eq!(app.speech.calls(), 0);
    assert!(app.storage.uploads().is_empty());
}

#[tokio::test]
async fn test_speak_urdu_script_is_spoken() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "آپ کیسے ہیں", "language": "ur" }))
        .send(app.router())
        .await;

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "ur");
    assert_eq!(app.speech.calls(), 1);
}

#[tokio::test]
async fn test_speak_blank_text_uses_avatar_envelope() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "   " }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Text is required");
    assert_eq!(app.speech.calls(), 0);
}

#[tokio::test]
async fn test_speak_malformed_json_uses_avatar_envelope() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .raw_json("{\"text\":")
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_speak_provider_failure_returns_500_envelope() {
    let app =
        common::create_test_app_with(MockLlm::replying("unused"), MockSpeech::failing(), &[])
            .await;

    let response = AxumTestRequest::post("/api/avatar/speak")
        .json(&json!({ "text": "hello there" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(app.storage.uploads().is_empty());
}

// ============================================================================
// POST /api/avatar/detect-language
// ============================================================================

#[tokio::test]
async fn test_detect_language() {
    let app = common::create_test_app().await;

    let cases = [
        ("آپ کیسے ہیں", "ur"),
        ("مرحبا بكم", "ar"),
        ("你好", "zh"),
        ("¿Dónde está?", "es"),
        ("Hello", "en"),
    ];
    for (text, expected) in cases {
        let response = AxumTestRequest::post("/api/avatar/detect-language")
            .json(&json!({ "text": text }))
            .send(app.router())
            .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json();
        assert_eq!(body["language"], expected, "text: {text}");
    }
}

#[tokio::test]
async fn test_detect_language_requires_text() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::post("/api/avatar/detect-language")
        .json(&json!({}))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Text is required");
}

// ============================================================================
// GET /api/avatar/languages
// ============================================================================

#[tokio::test]
async fn test_languages_lists_all_seven() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::get("/api/avatar/languages")
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let languages = body["languages"].as_array().unwrap();
    assert_eq!(languages.len(), 7);
    assert_eq!(languages[0]["code"], "en");
    assert_eq!(languages[0]["name"], "English");
    assert!(languages
        .iter()
        .any(|l| l["code"] == "ur" && l["nativeName"] == "اردو"));
}
