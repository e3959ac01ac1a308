// ABOUTME: Authentication route handlers for registration, login and the current user
// ABOUTME: Passwords are bcrypt-hashed off the async executor; tokens are HS256 JWTs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Authentication routes
//!
//! `AuthService` holds the registration and login rules so they can be
//! exercised without HTTP; `AuthRoutes` only adapts requests to it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use karetek_core::constants::auth::MIN_PASSWORD_LENGTH;
use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::{NewUser, User};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, AuthManager};
use crate::database::Database;
use crate::logging::AppLogger;
use crate::resources::ServerResources;
use crate::routes::{non_blank, ApiJson};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// User registration request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address, matched case-insensitively
    pub email: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Birth date
    pub date_of_birth: Option<String>,
    /// Gender
    pub gender: Option<String>,
    /// Phone number
    pub phone_number: Option<String>,
}

/// User login request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
}

/// Response for successful registration and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Human-readable outcome
    pub message: String,
    /// Bearer token
    pub token: String,
    /// The signed-in user
    pub user: User,
}

/// Registration and login rules
pub struct AuthService {
    auth_manager: Arc<AuthManager>,
    database: Database,
}

impl AuthService {
    /// Create a new auth service
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Database) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Register a new user and sign them in.
    ///
    /// Business rules:
    /// - Email, password, first name and last name are required
    /// - Passwords must be at least 8 characters
    /// - Emails are trimmed and lowercased before storage and lookup
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for missing or weak fields and
    /// `ResourceAlreadyExists` for a taken email
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
            non_blank(request.email),
            request.password.filter(|p| !p.is_empty()),
            non_blank(request.first_name),
            non_blank(request.last_name),
        ) else {
            return Err(AppError::invalid_input(
                "Email, password, first name, and last name are required",
            ));
        };

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        let email = normalize_email(&email);
        info!("User registration attempt for email: {email}");

        if self.database.users().get_by_email(&email).await?.is_some() {
            return Err(AppError::already_exists("User with this email already exists"));
        }

        let new_user = NewUser {
            email,
            password_hash: hash_password(password).await?,
            first_name: first_name.trim().to_owned(),
            last_name: last_name.trim().to_owned(),
            date_of_birth: non_blank(request.date_of_birth),
            gender: non_blank(request.gender),
            phone_number: non_blank(request.phone_number),
        };
        let user = self.database.users().create(&new_user).await?;
        let token = self.auth_manager.generate_token(&user)?;

        AppLogger::log_auth_event(&user.id, "register", true, None);
        Ok(AuthResponse {
            message: "User registered successfully".to_owned(),
            token,
            user,
        })
    }

    /// Verify credentials and issue a token.
    ///
    /// Business rules:
    /// - Unknown email and wrong password fail with the same message
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for missing fields and `AuthInvalid` for bad
    /// credentials
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let (Some(email), Some(password)) = (
            non_blank(request.email),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::invalid_input("Email and password are required"));
        };

        let email = normalize_email(&email);
        let Some(user) = self.database.users().get_by_email(&email).await? else {
            AppLogger::log_auth_event("unknown", "login", false, Some("unknown email"));
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            AppLogger::log_auth_event(&user.id, "login", false, Some("wrong password"));
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        }

        let token = self.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.id, "login", true, None);
        Ok(AuthResponse {
            message: "Login successful".to_owned(),
            token,
            user,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/me", get(Self::handle_me))
            .with_state(resources)
    }

    fn service(resources: &ServerResources) -> AuthService {
        AuthService::new(
            Arc::clone(&resources.auth_manager),
            resources.database.clone(),
        )
    }

    /// Handle user registration
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(request): ApiJson<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let response = Self::service(&resources).register(request).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle user login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(request): ApiJson<LoginRequest>,
    ) -> Result<Response, AppError> {
        let response = Self::service(&resources).login(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Return the authenticated user
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let user = resources
            .database
            .users()
            .get_by_id(&auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok((StatusCode::OK, Json(serde_json::json!({ "user": user }))).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ayesha@Example.COM "), "ayesha@example.com");
    }
}
