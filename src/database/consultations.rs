// ABOUTME: Database operations for consultation sessions keyed by client session id
// ABOUTME: Upserts the whole turn list and refuses to overwrite another user's session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::{ChatTurn, Consultation};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::now_rfc3339;

/// Result of saving a consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The row was inserted or replaced
    Written,
    /// The session id belongs to a different user; nothing was written
    OwnedByOtherUser,
}

impl UpsertOutcome {
    /// Whether the turns are now stored
    #[must_use]
    pub const fn is_written(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Consultation database operations manager
#[derive(Clone)]
pub struct ConsultationManager {
    pool: SqlitePool,
}

impl ConsultationManager {
    /// Create a new consultation manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the turn list of `session_id` for `user_id`
    ///
    /// An existing row is only replaced when it already belongs to
    /// `user_id`. Concurrent writes from the same owner are last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or database operation fails
    pub async fn upsert(
        &self,
        user_id: &str,
        session_id: &str,
        language: &str,
        messages: &[ChatTurn],
    ) -> AppResult<UpsertOutcome> {
        let messages_json = serde_json::to_string(messages).map_err(|e| {
            AppError::serialization(format!("Failed to serialize consultation: {e}"))
        })?;
        let now = now_rfc3339();

        let result = sqlx::query(
            r"
            INSERT INTO consultations (id, user_id, session_id, language, messages, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT(session_id) DO UPDATE SET
                language = excluded.language,
                messages = excluded.messages,
                updated_at = excluded.updated_at
            WHERE consultations.user_id IS excluded.user_id
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(session_id)
        .bind(language)
        .bind(&messages_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save consultation: {e}")))?;

        Ok(if result.rows_affected() > 0 {
            UpsertOutcome::Written
        } else {
            UpsertOutcome::OwnedByOtherUser
        })
    }

    /// List a user's consultations, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or a stored turn list is corrupt
    pub async fn list_for_user(&self, user_id: &str, limit: i64) -> AppResult<Vec<Consultation>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, session_id, language, messages, created_at, updated_at
            FROM consultations WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list consultations: {e}")))?;

        rows.iter().map(row_to_consultation).collect()
    }

    /// Fetch the user's own consultation for `session_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or the stored turn list is corrupt
    pub async fn get_by_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> AppResult<Option<Consultation>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, session_id, language, messages, created_at, updated_at
            FROM consultations WHERE session_id = $1 AND user_id = $2
            ",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get consultation: {e}")))?;

        row.as_ref().map(row_to_consultation).transpose()
    }

    /// Total number of consultations
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM consultations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count consultations: {e}")))
    }
}

fn row_to_consultation(row: &SqliteRow) -> AppResult<Consultation> {
    let messages_json: String = row.get("messages");
    let messages = serde_json::from_str(&messages_json).map_err(|e| {
        AppError::serialization(format!("Failed to parse consultation messages: {e}"))
    })?;

    Ok(Consultation {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        language: row.get("language"),
        messages,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
