// ABOUTME: Profile route handlers returning the user row with its medical child lists
// ABOUTME: Updates are partial; list arrays replace the matching child table wholesale
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::{ProfileUpdate, UserProfile};
use serde::Serialize;
use tracing::info;

use crate::database::Database;
use crate::resources::ServerResources;
use crate::routes::ApiJson;

/// Response for a profile update
#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    /// Human-readable outcome
    pub message: String,
    /// The profile after the update
    pub profile: UserProfile,
}

/// Load a user row and its three child lists
///
/// # Errors
///
/// Returns `ResourceNotFound` when the user no longer exists, or a database error
pub async fn load_profile(database: &Database, user_id: &str) -> AppResult<UserProfile> {
    let user = database
        .users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;

    let lists = database.profile_lists();
    let (medications, allergies, conditions) = tokio::try_join!(
        lists.list_medications(user_id),
        lists.list_allergies(user_id),
        lists.list_conditions(user_id),
    )?;

    Ok(UserProfile {
        user,
        medications,
        allergies,
        conditions,
    })
}

/// Profile routes
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/profile",
                get(Self::handle_get_profile).put(Self::handle_update_profile),
            )
            .with_state(resources)
    }

    /// Get the caller's profile
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let profile = load_profile(&resources.database, &auth.user_id).await?;

        Ok((StatusCode::OK, Json(serde_json::json!({ "profile": profile }))).into_response())
    }

    /// Apply a partial profile update
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(update): ApiJson<ProfileUpdate>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let database = &resources.database;

        if !database
            .users()
            .update_profile_with_lists(&auth.user_id, &update)
            .await?
        {
            return Err(AppError::not_found("Profile"));
        }

        info!(user_id = %auth.user_id, "Profile updated");
        let profile = load_profile(database, &auth.user_id).await?;
        Ok((
            StatusCode::OK,
            Json(ProfileUpdateResponse {
                message: "Profile updated successfully".to_owned(),
                profile,
            }),
        )
            .into_response())
    }
}
