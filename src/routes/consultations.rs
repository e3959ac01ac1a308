// ABOUTME: Consultation route handlers listing and fetching the caller's stored chat sessions
// ABOUTME: Sessions are looked up by client session id and never exposed across users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use karetek_core::constants::limits::{DEFAULT_CONSULTATIONS_LIMIT, MAX_CONSULTATIONS_LIMIT};
use karetek_core::errors::AppError;
use serde::Deserialize;
use serde_json::json;

use crate::resources::ServerResources;
use crate::routes::parse_limit;

/// Query parameters for listing consultations
#[derive(Debug, Default, Deserialize)]
pub struct ConsultationListQuery {
    /// Maximum number of sessions
    pub limit: Option<String>,
}

/// Consultation routes
pub struct ConsultationRoutes;

impl ConsultationRoutes {
    /// Create all consultation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/consultations", get(Self::handle_list))
            .route("/api/consultations/:session_id", get(Self::handle_get))
            .with_state(resources)
    }

    /// List the caller's consultations, newest first
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ConsultationListQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let limit = parse_limit(
            query.limit.as_deref(),
            DEFAULT_CONSULTATIONS_LIMIT,
            MAX_CONSULTATIONS_LIMIT,
        );

        let consultations = resources
            .database
            .consultations()
            .list_for_user(&auth.user_id, limit)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "consultations": consultations }))).into_response())
    }

    /// Fetch one of the caller's consultations by session id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let consultation = resources
            .database
            .consultations()
            .get_by_session(&auth.user_id, &session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Consultation"))?;

        Ok((StatusCode::OK, Json(json!({ "consultation": consultation }))).into_response())
    }
}
