// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Chat, translation, context assembly and avatar speech live here, independent of HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Domain service layer
//!
//! Route handlers parse requests and shape responses; the rules about what
//! happens in between live in these services so they can be tested with mock
//! collaborators.

/// Chat turn validation, LLM dispatch and consultation persistence
pub mod chat_orchestration;

/// Persona plus patient-context system prompt assembly
pub mod context_assembler;

/// Avatar text-to-speech pipeline
pub mod speech_synthesis;

/// Medical text translation
pub mod translation;

pub use context_assembler::{ContextAssembler, DatabaseProfileSource, PatientProfileSource};
