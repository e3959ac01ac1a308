// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database, call-counting provider mocks, test users and tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `karetek_server`
//!
//! Every external collaborator is replaced by a mock that records how often
//! it was called, so tests can assert that validation failures never reach
//! the LLM, the speech provider or storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use karetek_server::config::ServerConfig;
use karetek_server::database::Database;
use karetek_server::errors::{AppError, AppResult};
use karetek_server::llm::{ChatRequest, ChatResponse, LlmProvider};
use karetek_server::models::{NewUser, User};
use karetek_server::resources::ServerResources;
use karetek_server::server::build_router;
use karetek_server::speech::SpeechProvider;
use karetek_server::storage::{ObjectStorage, ObjectUpload};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Provider mocks
// ============================================================================

/// LLM mock returning a fixed reply (or failing) and recording requests
pub struct MockLlm {
    reply: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_owned()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &'static str {
        "mock-llm"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Some(content) => Ok(ChatResponse {
                content: content.clone(),
                model: "mock-model".to_owned(),
                usage: None,
                finish_reason: Some("stop".to_owned()),
            }),
            None => Err(AppError::external_service("mock-llm", "upstream exploded")),
        }
    }
}

/// Speech mock returning a few fake MP3 bytes
#[derive(Default)]
pub struct MockSpeech {
    fail: bool,
    calls: AtomicUsize,
    voices: Mutex<Vec<String>>,
}

impl MockSpeech {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    fn name(&self) -> &'static str {
        "mock-speech"
    }

    async fn synthesize(&self, _text: &str, voice_id: &str) -> Result<Bytes, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices.lock().unwrap().push(voice_id.to_owned());
        if self.fail {
            return Err(AppError::external_service("mock-speech", "quota exceeded"));
        }
        Ok(Bytes::from_static(b"ID3fake-mp3"))
    }
}

/// Storage mock keeping uploaded keys in memory
#[derive(Default)]
pub struct MockStorage {
    uploads: Mutex<Vec<ObjectUpload>>,
}

impl MockStorage {
    pub fn uploads(&self) -> Vec<ObjectUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    fn name(&self) -> &'static str {
        "mock-storage"
    }

    async fn put(&self, upload: ObjectUpload) -> AppResult<String> {
        let url = format!("https://cdn.test/avatar-audio/{}", upload.key);
        self.uploads.lock().unwrap().push(upload);
        Ok(url)
    }
}

// ============================================================================
// Test application
// ============================================================================

/// Configuration for tests: in-memory database and a fixed JWT secret
pub fn test_config(overrides: &[(&str, &str)]) -> ServerConfig {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "sqlite::memory:"),
        ("JWT_SECRET", "test_jwt_secret_for_integration_tests"),
        ("STORAGE_BACKEND", "local"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();
    for (key, value) in overrides {
        vars.insert((*key).to_owned(), (*value).to_owned());
    }
    ServerConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

/// A router plus handles on every mock behind it
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    pub llm: Arc<MockLlm>,
    pub speech: Arc<MockSpeech>,
    pub storage: Arc<MockStorage>,
    pub router: Router,
}

impl TestApp {
    /// Fresh router sharing the same resources (and rate limiter state)
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn database(&self) -> &Database {
        &self.resources.database
    }
}

/// Build a test app around the given mocks and config overrides
pub async fn create_test_app_with(
    llm: MockLlm,
    speech: MockSpeech,
    overrides: &[(&str, &str)],
) -> TestApp {
    init_test_logging();
    let config = test_config(overrides);
    let database = Database::new("sqlite::memory:", 1)
        .await
        .expect("in-memory database");

    let llm = Arc::new(llm);
    let speech = Arc::new(speech);
    let storage = Arc::new(MockStorage::default());

    let resources = Arc::new(ServerResources::new(
        database,
        config,
        llm.clone(),
        speech.clone(),
        storage.clone(),
    ));
    let router = build_router(resources.clone());

    TestApp {
        resources,
        llm,
        speech,
        storage,
        router,
    }
}

/// Test app whose LLM always answers `"Stay hydrated."`
pub async fn create_test_app() -> TestApp {
    create_test_app_with(
        MockLlm::replying("Stay hydrated."),
        MockSpeech::default(),
        &[],
    )
    .await
}

/// Insert a user directly (skipping bcrypt) and mint a token for them
pub async fn create_test_user(app: &TestApp, email: &str) -> (User, String) {
    let user = app
        .database()
        .users()
        .create(&NewUser {
            email: email.to_owned(),
            password_hash: "not-a-real-hash".to_owned(),
            first_name: "Test".to_owned(),
            last_name: "Patient".to_owned(),
            date_of_birth: Some("1985-03-10".to_owned()),
            gender: Some("female".to_owned()),
            phone_number: None,
        })
        .await
        .expect("create test user");
    let token = app
        .resources
        .auth_manager
        .generate_token(&user)
        .expect("token");
    (user, token)
}
