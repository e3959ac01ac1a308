// ABOUTME: Database operations for dated health record entries
// ABOUTME: Records are listed newest first and mutated only by their owner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::HealthRecord;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::now_rfc3339;

const DEFAULT_RECORD_TYPE: &str = "general";

/// Fields for a new health record
#[derive(Debug, Clone, Default)]
pub struct NewHealthRecord {
    /// Category; defaults to `general`
    pub record_type: Option<String>,
    /// Title (required)
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Event date; defaults to today
    pub date: Option<String>,
    /// Clinician or facility
    pub provider_name: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

/// Partial update of a health record
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    /// Category
    pub record_type: Option<String>,
    /// Title
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

/// Health record database operations manager
#[derive(Clone)]
pub struct HealthRecordManager {
    pool: SqlitePool,
}

impl HealthRecordManager {
    /// Create a new health record manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List a user's records, newest date first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<HealthRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, record_type, title, description, date, provider_name, notes, created_at
            FROM health_records WHERE user_id = $1
            ORDER BY date DESC, created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list health records: {e}")))?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    /// Insert a record for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn create(&self, user_id: &str, record: &NewHealthRecord) -> AppResult<HealthRecord> {
        let id = Uuid::new_v4().to_string();
        let record_type = record
            .record_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_RECORD_TYPE);
        let date = record
            .date
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().date_naive().to_string());

        sqlx::query(
            r"
            INSERT INTO health_records (id, user_id, record_type, title, description, date,
                                        provider_name, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(record_type)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&date)
        .bind(&record.provider_name)
        .bind(&record.notes)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add health record: {e}")))?;

        self.get(user_id, &id)
            .await?
            .ok_or_else(|| AppError::database("Health record could not be read back"))
    }

    /// Fetch one record owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<Option<HealthRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, record_type, title, description, date, provider_name, notes, created_at
            FROM health_records WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get health record: {e}")))?;

        Ok(row.as_ref().map(row_to_record))
    }

    /// Partially update a record owned by `user_id`; `None` when no row matched
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: &RecordUpdate,
    ) -> AppResult<Option<HealthRecord>> {
        let result = sqlx::query(
            r"
            UPDATE health_records SET
                record_type = COALESCE($1, record_type),
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                date = COALESCE($4, date),
                provider_name = COALESCE($5, provider_name),
                notes = COALESCE($6, notes)
            WHERE id = $7 AND user_id = $8
            ",
        )
        .bind(&update.record_type)
        .bind(update.title.as_deref().filter(|t| !t.trim().is_empty()))
        .bind(&update.description)
        .bind(&update.date)
        .bind(&update.provider_name)
        .bind(&update.notes)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update health record: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(user_id, id).await
    }

    /// Delete a record owned by `user_id`; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM health_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete health record: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: &SqliteRow) -> HealthRecord {
    HealthRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        record_type: row.get("record_type"),
        title: row.get("title"),
        description: row.get("description"),
        date: row.get("date"),
        provider_name: row.get("provider_name"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}
