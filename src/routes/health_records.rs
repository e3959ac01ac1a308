// ABOUTME: Health record route handlers plus the medications, allergies and conditions sub-resources
// ABOUTME: All reads and mutations are scoped to the authenticated owner; zero matched rows is a 404
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Health record routes
//!
//! The child lists live under `/api/health-records/{medications,allergies,conditions}`
//! and are individually addressable by id, unlike the profile form which
//! replaces them wholesale.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use karetek_core::errors::AppError;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::database::{AllergyInput, ConditionInput, MedicationInput, NewHealthRecord, RecordUpdate};
use crate::resources::ServerResources;
use crate::routes::{non_blank, ApiJson};

/// Body for creating or updating a health record
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    /// Category, e.g. `lab_result`
    pub record_type: Option<String>,
    /// Title (required on create)
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Event date
    pub date: Option<String>,
    /// Clinician or facility
    pub provider_name: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

/// Health record routes
pub struct HealthRecordRoutes;

impl HealthRecordRoutes {
    /// Create all health record and child-list routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/health-records",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/health-records/:id",
                put(Self::handle_update).delete(Self::handle_delete),
            )
            .route(
                "/api/health-records/medications",
                get(Self::handle_list_medications).post(Self::handle_add_medication),
            )
            .route(
                "/api/health-records/medications/:id",
                put(Self::handle_update_medication).delete(Self::handle_delete_medication),
            )
            .route(
                "/api/health-records/allergies",
                get(Self::handle_list_allergies).post(Self::handle_add_allergy),
            )
            .route(
                "/api/health-records/allergies/:id",
                put(Self::handle_update_allergy).delete(Self::handle_delete_allergy),
            )
            .route(
                "/api/health-records/conditions",
                get(Self::handle_list_conditions).post(Self::handle_add_condition),
            )
            .route(
                "/api/health-records/conditions/:id",
                put(Self::handle_update_condition).delete(Self::handle_delete_condition),
            )
            .with_state(resources)
    }

    // ========================================================================
    // Health records
    // ========================================================================

    /// List the caller's records
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let records = resources
            .database
            .health_records()
            .list(&auth.user_id)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "records": records }))).into_response())
    }

    /// Add a record
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<RecordRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let title =
            non_blank(request.title).ok_or_else(|| AppError::invalid_input("Title is required"))?;

        let record = resources
            .database
            .health_records()
            .create(
                &auth.user_id,
                &NewHealthRecord {
                    record_type: non_blank(request.record_type),
                    title,
                    description: request.description,
                    date: non_blank(request.date),
                    provider_name: request.provider_name,
                    notes: request.notes,
                },
            )
            .await?;

        info!(user_id = %auth.user_id, record_id = %record.id, "Health record added");
        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Health record added successfully",
                "record": record,
            })),
        )
            .into_response())
    }

    /// Update one of the caller's records
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(request): ApiJson<RecordRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let update = RecordUpdate {
            record_type: non_blank(request.record_type),
            title: request.title,
            description: request.description,
            date: non_blank(request.date),
            provider_name: request.provider_name,
            notes: request.notes,
        };

        let record = resources
            .database
            .health_records()
            .update(&auth.user_id, &id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Health record"))?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Health record updated successfully",
                "record": record,
            })),
        )
            .into_response())
    }

    /// Delete one of the caller's records
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        if !resources
            .database
            .health_records()
            .delete(&auth.user_id, &id)
            .await?
        {
            return Err(AppError::not_found("Health record"));
        }

        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Health record deleted successfully" })),
        )
            .into_response())
    }

    // ========================================================================
    // Medications
    // ========================================================================

    async fn handle_list_medications(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let medications = resources
            .database
            .profile_lists()
            .list_medications(&auth.user_id)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "medications": medications }))).into_response())
    }

    async fn handle_add_medication(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(input): ApiJson<MedicationInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let medication = resources
            .database
            .profile_lists()
            .add_medication(&auth.user_id, &input)
            .await?;

        Ok((StatusCode::CREATED, Json(json!({ "medication": medication }))).into_response())
    }

    async fn handle_update_medication(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(input): ApiJson<MedicationInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let medication = resources
            .database
            .profile_lists()
            .update_medication(&auth.user_id, &id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Medication"))?;

        Ok((StatusCode::OK, Json(json!({ "medication": medication }))).into_response())
    }

    async fn handle_delete_medication(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        if !resources
            .database
            .profile_lists()
            .delete_medication(&auth.user_id, &id)
            .await?
        {
            return Err(AppError::not_found("Medication"));
        }

        Ok((StatusCode::OK, Json(json!({ "message": "Medication deleted successfully" })))
            .into_response())
    }

    // ========================================================================
    // Allergies
    // ========================================================================

    async fn handle_list_allergies(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let allergies = resources
            .database
            .profile_lists()
            .list_allergies(&auth.user_id)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "allergies": allergies }))).into_response())
    }

    async fn handle_add_allergy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(input): ApiJson<AllergyInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let allergy = resources
            .database
            .profile_lists()
            .add_allergy(&auth.user_id, &input)
            .await?;

        Ok((StatusCode::CREATED, Json(json!({ "allergy": allergy }))).into_response())
    }

    async fn handle_update_allergy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(input): ApiJson<AllergyInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let allergy = resources
            .database
            .profile_lists()
            .update_allergy(&auth.user_id, &id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Allergy"))?;

        Ok((StatusCode::OK, Json(json!({ "allergy": allergy }))).into_response())
    }

    async fn handle_delete_allergy(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        if !resources
            .database
            .profile_lists()
            .delete_allergy(&auth.user_id, &id)
            .await?
        {
            return Err(AppError::not_found("Allergy"));
        }

        Ok((StatusCode::OK, Json(json!({ "message": "Allergy deleted successfully" })))
            .into_response())
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    async fn handle_list_conditions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let conditions = resources
            .database
            .profile_lists()
            .list_conditions(&auth.user_id)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "conditions": conditions }))).into_response())
    }

    async fn handle_add_condition(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(input): ApiJson<ConditionInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let condition = resources
            .database
            .profile_lists()
            .add_condition(&auth.user_id, &input)
            .await?;

        Ok((StatusCode::CREATED, Json(json!({ "condition": condition }))).into_response())
    }

    async fn handle_update_condition(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(input): ApiJson<ConditionInput>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let condition = resources
            .database
            .profile_lists()
            .update_condition(&auth.user_id, &id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Condition"))?;

        Ok((StatusCode::OK, Json(json!({ "condition": condition }))).into_response())
    }

    async fn handle_delete_condition(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        if !resources
            .database
            .profile_lists()
            .delete_condition(&auth.user_id, &id)
            .await?
        {
            return Err(AppError::not_found("Condition"));
        }

        Ok((StatusCode::OK, Json(json!({ "message": "Condition deleted successfully" })))
            .into_response())
    }
}
