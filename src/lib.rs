// ABOUTME: Main library entry point for the Karetek telehealth API server
// ABOUTME: AI health chat, patient records and a multilingual speaking avatar over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

#![deny(unsafe_code)]

//! # Karetek Server
//!
//! Backend for the Karetek AI health assistant.
//!
//! ## Features
//!
//! - **AI consultations**: chat turns personalized with the patient's medical profile
//! - **Translation**: medical translation of consultation history
//! - **Speaking avatar**: text-to-speech with language auto-detection
//! - **Health data**: profile, metrics, records, medications, allergies and conditions
//!
//! ## Architecture
//!
//! - **Routes**: thin axum handlers per domain
//! - **Services**: chat orchestration, context assembly, translation, speech
//! - **Providers**: LLM, speech and object storage behind traits
//! - **Database**: `SQLite` managers per table group
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use karetek_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Karetek configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT issuing/validation and password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// `SQLite` persistence
pub mod database;

/// Chat completion providers and system prompts
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Authentication, CORS, rate limiting and request tracing
pub mod middleware;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Router assembly and serving
pub mod server;

/// Business logic between routes and providers
pub mod services;

/// Text-to-speech providers
pub mod speech;

/// Object storage for synthesized audio
pub mod storage;

pub use karetek_core::{constants, errors, language, models};
