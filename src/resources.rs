// ABOUTME: Shared server resources built once at start-up and handed to every route
// ABOUTME: Holds the database, auth, configuration and the injected LLM, speech and storage clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Server Resources
//!
//! Expensive collaborators are constructed once and shared through
//! `Arc<ServerResources>` so handlers never build HTTP clients or pools per
//! request. External providers are trait objects, which lets tests swap in
//! mocks through [`ServerResources::new`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::middleware::{ApiRateLimiter, AuthMiddleware};
use crate::services::{ContextAssembler, DatabaseProfileSource, PatientProfileSource};
use crate::speech::{ElevenLabsConfig, ElevenLabsProvider, SpeechProvider};
use crate::storage::{create_storage, ObjectStorage};

/// Everything a request handler may need
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Token issuing and validation
    pub auth_manager: Arc<AuthManager>,
    /// Bearer-token authentication for handlers
    pub auth_middleware: AuthMiddleware,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Chat completion provider
    pub llm: Arc<dyn LlmProvider>,
    /// Text-to-speech provider
    pub speech: Arc<dyn SpeechProvider>,
    /// Audio object storage
    pub storage: Arc<dyn ObjectStorage>,
    /// Chat system prompt builder
    pub context_assembler: ContextAssembler,
    /// Per-IP limiter for `/api`
    pub rate_limiter: ApiRateLimiter,
}

impl ServerResources {
    /// Assemble resources from already-built collaborators
    #[must_use]
    pub fn new(
        database: Database,
        config: ServerConfig,
        llm: Arc<dyn LlmProvider>,
        speech: Arc<dyn SpeechProvider>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let auth_manager = Arc::new(AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_expiry_hours,
        ));
        let profile_source: Arc<dyn PatientProfileSource> =
            Arc::new(DatabaseProfileSource::new(database.clone()));

        Self {
            auth_middleware: AuthMiddleware::new(Arc::clone(&auth_manager)),
            context_assembler: ContextAssembler::new(profile_source),
            rate_limiter: ApiRateLimiter::new(config.security.rate_limit.clone()),
            auth_manager,
            database,
            config: Arc::new(config),
            llm,
            speech,
            storage,
        }
    }

    /// Replace the patient profile source used by the context assembler
    #[must_use]
    pub fn with_profile_source(mut self, source: Arc<dyn PatientProfileSource>) -> Self {
        self.context_assembler = ContextAssembler::new(source);
        self
    }

    /// Build production resources from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or a provider client
    /// cannot be constructed
    pub async fn from_config(config: ServerConfig) -> Result<Self> {
        let database = Database::new(
            &config.database.url.to_connection_string(),
            config.database.max_connections,
        )
        .await?;

        let llm = OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::from(&config.llm))
            .context("Failed to initialize LLM provider")?;
        let speech = ElevenLabsProvider::new(ElevenLabsConfig::from(&config.speech))
            .context("Failed to initialize speech provider")?;
        let storage = create_storage(&config.storage).context("Failed to initialize storage")?;

        info!(
            llm = llm.name(),
            speech = speech.name(),
            storage = storage.name(),
            "Server resources initialized"
        );

        Ok(Self::new(
            database,
            config,
            Arc::new(llm),
            Arc::new(speech),
            storage,
        ))
    }
}
