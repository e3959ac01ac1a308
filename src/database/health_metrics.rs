// ABOUTME: Database operations for user health metrics (blood pressure, weight, glucose, ...)
// ABOUTME: All reads and mutations are scoped to the owning user's id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::HealthMetric;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::now_rfc3339;

/// Fields for a new metric; the value is already stringified
#[derive(Debug, Clone)]
pub struct NewHealthMetric {
    /// Metric kind
    pub metric_type: String,
    /// Reading
    pub value: String,
    /// Unit of measurement
    pub unit: String,
    /// Notes
    pub notes: Option<String>,
    /// When the reading was taken; defaults to now
    pub recorded_at: Option<String>,
}

/// Partial update of a metric; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct MetricUpdate {
    /// Reading
    pub value: Option<String>,
    /// Unit of measurement
    pub unit: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// When the reading was taken
    pub recorded_at: Option<String>,
}

/// Health metric database operations manager
#[derive(Clone)]
pub struct HealthMetricManager {
    pool: SqlitePool,
}

impl HealthMetricManager {
    /// Create a new health metric manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List a user's metrics, newest reading first, optionally filtered by type
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(
        &self,
        user_id: &str,
        metric_type: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<HealthMetric>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, metric_type, value, unit, notes, recorded_at, created_at
            FROM health_metrics
            WHERE user_id = $1 AND ($2 IS NULL OR metric_type = $2)
            ORDER BY recorded_at DESC
            LIMIT $3
            ",
        )
        .bind(user_id)
        .bind(metric_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list health metrics: {e}")))?;

        Ok(rows.iter().map(row_to_metric).collect())
    }

    /// Insert a metric for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create(&self, user_id: &str, metric: &NewHealthMetric) -> AppResult<HealthMetric> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let recorded_at = metric.recorded_at.clone().unwrap_or_else(|| now.clone());

        sqlx::query(
            r"
            INSERT INTO health_metrics (id, user_id, metric_type, value, unit, notes, recorded_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&metric.metric_type)
        .bind(&metric.value)
        .bind(&metric.unit)
        .bind(&metric.notes)
        .bind(&recorded_at)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add health metric: {e}")))?;

        self.get(user_id, &id)
            .await?
            .ok_or_else(|| AppError::database("Health metric could not be read back"))
    }

    /// Fetch one metric owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<Option<HealthMetric>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, metric_type, value, unit, notes, recorded_at, created_at
            FROM health_metrics WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get health metric: {e}")))?;

        Ok(row.as_ref().map(row_to_metric))
    }

    /// Partially update a metric owned by `user_id`; `None` when no row matched
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: &MetricUpdate,
    ) -> AppResult<Option<HealthMetric>> {
        let result = sqlx::query(
            r"
            UPDATE health_metrics SET
                value = COALESCE($1, value),
                unit = COALESCE($2, unit),
                notes = COALESCE($3, notes),
                recorded_at = COALESCE($4, recorded_at)
            WHERE id = $5 AND user_id = $6
            ",
        )
        .bind(&update.value)
        .bind(&update.unit)
        .bind(&update.notes)
        .bind(&update.recorded_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update health metric: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(user_id, id).await
    }

    /// Delete a metric owned by `user_id`; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM health_metrics WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete health metric: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of metrics across all users
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM health_metrics")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count health metrics: {e}")))
    }
}

fn row_to_metric(row: &SqliteRow) -> HealthMetric {
    HealthMetric {
        id: row.get("id"),
        user_id: row.get("user_id"),
        metric_type: row.get("metric_type"),
        value: row.get("value"),
        unit: row.get("unit"),
        notes: row.get("notes"),
        recorded_at: row.get("recorded_at"),
        created_at: row.get("created_at"),
    }
}
