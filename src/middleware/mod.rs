// ABOUTME: HTTP middleware for request tracing, authentication, CORS and rate limiting
// ABOUTME: Provides request ID generation, caller identity resolution and per-IP throttling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

/// Bearer-token authentication and caller identity
pub mod auth;
/// Cross-origin resource sharing configuration
pub mod cors;
/// Per-IP fixed-window rate limiting
pub mod rate_limiting;
/// Request ID generation and request spans
pub mod tracing;

// Authentication middleware
pub use self::auth::{AuthMiddleware, AuthenticatedUser, RequestIdentity};

// CORS configuration
pub use self::cors::setup_cors;

// Rate limiting middleware and utilities
pub use self::rate_limiting::{create_rate_limit_headers, headers, rate_limit_middleware, ApiRateLimiter};

// Request tracing
pub use self::tracing::{create_request_span, RequestIdGenerator, REQUEST_ID_HEADER};
