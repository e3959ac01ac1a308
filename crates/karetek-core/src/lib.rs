// ABOUTME: Core types and constants for the Karetek telehealth API
// ABOUTME: Foundation crate with error handling, language codes and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

#![deny(unsafe_code)]

//! # Karetek Core
//!
//! Foundation crate providing shared types and constants for the Karetek
//! telehealth API. It changes rarely, so the server crate recompiles faster.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Application-wide constants organized by domain
//! - **language**: Supported languages and script-based detection
//! - **models**: Users, profile lists, health data and consultations

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Supported languages and language auto-detection
pub mod language;

/// Core data models (User, HealthMetric, Consultation, etc.)
pub mod models;
