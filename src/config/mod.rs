// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven server configuration sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Configuration module for the Karetek server
//!
//! All configuration comes from environment variables; see [`environment`].

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AuthConfig, DatabaseConfig, DatabaseUrl, Environment, LlmConfig, RateLimitConfig,
    SecurityConfig, ServerConfig, SpeechConfig, StorageBackend, StorageConfig,
};
