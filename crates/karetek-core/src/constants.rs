// ABOUTME: Application-wide constants grouped by domain
// ABOUTME: Endpoint paths, list limits, auth defaults and public stats fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Constants module
//!
//! Constants are grouped into small domain modules rather than one flat list.

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// API base path
    pub const API_BASE: &str = "/api";
}

/// Authentication defaults
pub mod auth {
    /// Minimum accepted password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    /// bcrypt work factor for stored password hashes
    pub const BCRYPT_COST: u32 = 12;
    /// Default token lifetime (7 days)
    pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24 * 7;
    /// Development-only signing secret; rejected in production
    pub const DEV_JWT_SECRET: &str = "karetek_dev_secret_change_me";
}

/// Pagination limits for list endpoints
pub mod limits {
    /// Default number of health metrics returned
    pub const DEFAULT_METRICS_LIMIT: u32 = 50;
    /// Maximum number of health metrics returned
    pub const MAX_METRICS_LIMIT: u32 = 500;
    /// Default number of consultations returned
    pub const DEFAULT_CONSULTATIONS_LIMIT: u32 = 20;
    /// Maximum number of consultations returned
    pub const MAX_CONSULTATIONS_LIMIT: u32 = 100;
    /// Maximum accepted request body size (10 MiB)
    pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;
}

/// Public stats shown on the landing page when live counts are unavailable
pub mod stats {
    /// Fallback consultation count
    pub const FALLBACK_TOTAL_CONSULTATIONS: i64 = 19_509_522;
    /// Fallback user count
    pub const FALLBACK_ACTIVE_USERS: i64 = 150_000;
    /// Fallback tracked metric count
    pub const FALLBACK_HEALTH_METRICS: i64 = 500_000;
}

/// Chat sampling parameters
pub mod chat {
    /// Default completion model
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    /// Temperature for assistant replies
    pub const CHAT_TEMPERATURE: f32 = 0.7;
    /// Token cap for assistant replies
    pub const CHAT_MAX_TOKENS: u32 = 1000;
    /// Temperature for translations
    pub const TRANSLATE_TEMPERATURE: f32 = 0.3;
    /// Token cap for translations
    pub const TRANSLATE_MAX_TOKENS: u32 = 2000;
}
