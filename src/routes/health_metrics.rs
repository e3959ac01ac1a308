// ABOUTME: Health metric route handlers for listing, adding, updating and deleting readings
// ABOUTME: Numeric or structured values are stringified; every mutation is owner-filtered
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use karetek_core::constants::limits::{DEFAULT_METRICS_LIMIT, MAX_METRICS_LIMIT};
use karetek_core::errors::AppError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::database::{MetricUpdate, NewHealthMetric};
use crate::resources::ServerResources;
use crate::routes::{non_blank, parse_limit, ApiJson};

/// Query parameters for listing metrics
#[derive(Debug, Default, Deserialize)]
pub struct MetricListQuery {
    /// Only return this metric type
    #[serde(rename = "type")]
    pub metric_type: Option<String>,
    /// Maximum number of readings
    pub limit: Option<String>,
}

/// Body for adding a metric
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetricRequest {
    /// Metric kind, e.g. `blood_pressure`
    pub metric_type: Option<String>,
    /// Reading; strings are kept, anything else is stored as JSON text
    pub value: Option<Value>,
    /// Unit of measurement
    pub unit: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// When the reading was taken
    pub recorded_at: Option<String>,
}

/// Body for updating a metric
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMetricRequest {
    /// Reading
    pub value: Option<Value>,
    /// Unit of measurement
    pub unit: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// When the reading was taken
    pub recorded_at: Option<String>,
}

/// Stored text form of a metric value; `null` and blank strings count as absent
fn stringify_value(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => non_blank(Some(s)),
        other => Some(other.to_string()),
    }
}

/// Health metric routes
pub struct HealthMetricRoutes;

impl HealthMetricRoutes {
    /// Create all health metric routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/health-metrics",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/health-metrics/:id",
                put(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// List the caller's metrics
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<MetricListQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;
        let limit = parse_limit(
            query.limit.as_deref(),
            DEFAULT_METRICS_LIMIT,
            MAX_METRICS_LIMIT,
        );
        let metric_type = non_blank(query.metric_type);

        let metrics = resources
            .database
            .health_metrics()
            .list(&auth.user_id, metric_type.as_deref(), limit)
            .await?;

        Ok((StatusCode::OK, Json(json!({ "metrics": metrics }))).into_response())
    }

    /// Add a reading
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        ApiJson(request): ApiJson<CreateMetricRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;

        let (Some(metric_type), Some(value), Some(unit)) = (
            non_blank(request.metric_type),
            stringify_value(request.value),
            non_blank(request.unit),
        ) else {
            return Err(AppError::invalid_input(
                "Metric type, value, and unit are required",
            ));
        };

        let metric = resources
            .database
            .health_metrics()
            .create(
                &auth.user_id,
                &NewHealthMetric {
                    metric_type,
                    value,
                    unit,
                    notes: request.notes,
                    recorded_at: non_blank(request.recorded_at),
                },
            )
            .await?;

        info!(user_id = %auth.user_id, metric_type = %metric.metric_type, "Health metric added");
        Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Health metric added successfully",
                "metric": metric,
            })),
        )
            .into_response())
    }

    /// Update one of the caller's readings
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        ApiJson(request): ApiJson<UpdateMetricRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;

        let update = MetricUpdate {
            value: stringify_value(request.value),
            unit: non_blank(request.unit),
            notes: request.notes,
            recorded_at: non_blank(request.recorded_at),
        };
        let metric = resources
            .database
            .health_metrics()
            .update(&auth.user_id, &id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Health metric"))?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Health metric updated successfully",
                "metric": metric,
            })),
        )
            .into_response())
    }

    /// Delete one of the caller's readings
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_headers(&headers)?;

        if !resources
            .database
            .health_metrics()
            .delete(&auth.user_id, &id)
            .await?
        {
            return Err(AppError::not_found("Health metric"));
        }

        info!(user_id = %auth.user_id, metric_id = %id, "Health metric deleted");
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Health metric deleted successfully" })),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_value() {
        assert_eq!(stringify_value(Some(json!("120/80"))), Some("120/80".to_owned()));
        assert_eq!(stringify_value(Some(json!(72))), Some("72".to_owned()));
        assert_eq!(stringify_value(Some(json!(98.6))), Some("98.6".to_owned()));
        assert_eq!(
            stringify_value(Some(json!({"systolic": 120}))),
            Some(r#"{"systolic":120}"#.to_owned())
        );
        assert_eq!(stringify_value(Some(Value::Null)), None);
        assert_eq!(stringify_value(Some(json!(""))), None);
        assert_eq!(stringify_value(None), None);
    }
}
