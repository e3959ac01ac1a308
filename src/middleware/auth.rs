// ABOUTME: Request authentication resolving bearer tokens into a caller identity
// ABOUTME: Supports required authentication and optional authentication with anonymous fallback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Authentication Middleware
//!
//! Routes call [`AuthMiddleware::authenticate_request`] when a caller must be
//! signed in, and [`AuthMiddleware::identify_request`] when anonymous use is
//! allowed. The latter never fails: a missing or bad token yields
//! [`RequestIdentity::Anonymous`].

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use karetek_core::errors::{AppError, AppResult};
use tracing::field::Empty;
use tracing::Span;

use crate::auth::AuthManager;

/// A caller whose bearer token was verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User ID from the token subject
    pub user_id: String,
    /// Email from the token claims
    pub email: String,
}

/// Who is making a request on an optional-auth route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestIdentity {
    /// No usable credential was presented
    Anonymous,
    /// A valid bearer token was presented
    Authenticated(AuthenticatedUser),
}

impl RequestIdentity {
    /// The authenticated user, if any
    #[must_use]
    pub const fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

/// Bearer-token authentication shared by all routes
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
}

impl AuthMiddleware {
    /// Create middleware validating tokens with `auth_manager`
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>) -> Self {
        Self { auth_manager }
    }

    /// Authenticate a request that requires a signed-in caller
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` (401) when no token is present and
    /// `AuthExpired`/`AuthMalformed` (403) when the token does not verify
    #[tracing::instrument(
        skip(self, auth_header),
        fields(user_id = Empty, success = Empty)
    )]
    pub fn authenticate_request(&self, auth_header: Option<&str>) -> AppResult<AuthenticatedUser> {
        let Some(token) = auth_header.and_then(extract_token) else {
            tracing::debug!("Authentication failed: missing bearer token");
            Span::current().record("success", false);
            return Err(AppError::auth_required());
        };

        match self.auth_manager.validate_token(token) {
            Ok(claims) => {
                Span::current()
                    .record("user_id", claims.sub.as_str())
                    .record("success", true);
                Ok(AuthenticatedUser {
                    user_id: claims.sub,
                    email: claims.email,
                })
            }
            Err(e) => {
                Span::current().record("success", false);
                tracing::warn!("JWT authentication failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Resolve the caller on an optional-auth route
    #[must_use]
    pub fn identify_request(&self, auth_header: Option<&str>) -> RequestIdentity {
        if auth_header.and_then(extract_token).is_none() {
            return RequestIdentity::Anonymous;
        }
        self.authenticate_request(auth_header)
            .map_or(RequestIdentity::Anonymous, RequestIdentity::Authenticated)
    }

    /// Authenticate using the `Authorization` header of `headers`
    ///
    /// # Errors
    ///
    /// See [`Self::authenticate_request`]
    pub fn authenticate_headers(&self, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
        self.authenticate_request(authorization_header(headers))
    }

    /// Resolve the caller from the `Authorization` header of `headers`
    #[must_use]
    pub fn identify_headers(&self, headers: &HeaderMap) -> RequestIdentity {
        self.identify_request(authorization_header(headers))
    }
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// Take the credential after the scheme (`Bearer <token>`)
fn extract_token(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split_whitespace();
    let first = parts.next()?;
    let token = parts.next().unwrap_or(first);
    if token.eq_ignore_ascii_case("bearer") || token.is_empty() {
        None
    } else {
        Some(token)
    }
}
