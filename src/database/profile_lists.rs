// ABOUTME: Database operations for the medications, allergies and conditions child tables
// ABOUTME: Each entry is its own row keyed by id and owned by exactly one user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::{Allergy, Condition, Medication};
use serde::Deserialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::now_rfc3339;

// ============================================================================
// Input Types
// ============================================================================

/// Medication fields accepted on create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInput {
    /// Medication name (required on create)
    pub name: Option<String>,
    /// Dose
    pub dosage: Option<String>,
    /// Frequency
    pub frequency: Option<String>,
    /// Prescribing clinician
    pub prescribed_by: Option<String>,
    /// Start date
    pub start_date: Option<String>,
}

/// Allergy fields accepted on create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyInput {
    /// Allergen (required on create)
    pub allergen: Option<String>,
    /// Reaction
    pub reaction: Option<String>,
    /// Severity
    pub severity: Option<String>,
}

/// Condition fields accepted on create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionInput {
    /// Condition name (required on create)
    pub name: Option<String>,
    /// Diagnosis date
    pub diagnosed_date: Option<String>,
    /// Status
    pub status: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

// ============================================================================
// Profile List Manager
// ============================================================================

/// Profile child-list database operations manager
#[derive(Clone)]
pub struct ProfileListManager {
    pool: SqlitePool,
}

impl ProfileListManager {
    /// Create a new profile list manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Medications
    // ========================================================================

    /// List a user's medications, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_medications(&self, user_id: &str) -> AppResult<Vec<Medication>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, dosage, frequency, prescribed_by, start_date, created_at
            FROM user_medications WHERE user_id = $1 ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list medications: {e}")))?;

        Ok(rows.iter().map(row_to_medication).collect())
    }

    /// Add a medication
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or database operation fails
    pub async fn add_medication(
        &self,
        user_id: &str,
        input: &MedicationInput,
    ) -> AppResult<Medication> {
        let name = required(input.name.as_deref(), "Medication name is required")?;
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r"
            INSERT INTO user_medications (id, user_id, name, dosage, frequency, prescribed_by, start_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(&input.dosage)
        .bind(&input.frequency)
        .bind(&input.prescribed_by)
        .bind(&input.start_date)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add medication: {e}")))?;

        self.get_medication(user_id, &id)
            .await?
            .ok_or_else(|| AppError::database("Medication could not be read back"))
    }

    /// Partially update a medication owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_medication(
        &self,
        user_id: &str,
        id: &str,
        input: &MedicationInput,
    ) -> AppResult<Option<Medication>> {
        let result = sqlx::query(
            r"
            UPDATE user_medications SET
                name = COALESCE($1, name),
                dosage = COALESCE($2, dosage),
                frequency = COALESCE($3, frequency),
                prescribed_by = COALESCE($4, prescribed_by),
                start_date = COALESCE($5, start_date)
            WHERE id = $6 AND user_id = $7
            ",
        )
        .bind(non_blank(input.name.as_deref()))
        .bind(&input.dosage)
        .bind(&input.frequency)
        .bind(&input.prescribed_by)
        .bind(&input.start_date)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update medication: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_medication(user_id, id).await
    }

    /// Delete a medication owned by `user_id`; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_medication(&self, user_id: &str, id: &str) -> AppResult<bool> {
        self.delete_owned("user_medications", user_id, id).await
    }

    async fn get_medication(&self, user_id: &str, id: &str) -> AppResult<Option<Medication>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, dosage, frequency, prescribed_by, start_date, created_at
            FROM user_medications WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get medication: {e}")))?;

        Ok(row.as_ref().map(row_to_medication))
    }

    // ========================================================================
    // Allergies
    // ========================================================================

    /// List a user's allergies, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_allergies(&self, user_id: &str) -> AppResult<Vec<Allergy>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, allergen, reaction, severity, created_at
            FROM user_allergies WHERE user_id = $1 ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list allergies: {e}")))?;

        Ok(rows.iter().map(row_to_allergy).collect())
    }

    /// Add an allergy
    ///
    /// # Errors
    ///
    /// Returns an error if the allergen is missing or database operation fails
    pub async fn add_allergy(&self, user_id: &str, input: &AllergyInput) -> AppResult<Allergy> {
        let allergen = required(input.allergen.as_deref(), "Allergen is required")?;
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r"
            INSERT INTO user_allergies (id, user_id, allergen, reaction, severity, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(allergen)
        .bind(&input.reaction)
        .bind(&input.severity)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add allergy: {e}")))?;

        self.get_allergy(user_id, &id)
            .await?
            .ok_or_else(|| AppError::database("Allergy could not be read back"))
    }

    /// Partially update an allergy owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_allergy(
        &self,
        user_id: &str,
        id: &str,
        input: &AllergyInput,
    ) -> AppResult<Option<Allergy>> {
        let result = sqlx::query(
            r"
            UPDATE user_allergies SET
                allergen = COALESCE($1, allergen),
                reaction = COALESCE($2, reaction),
                severity = COALESCE($3, severity)
            WHERE id = $4 AND user_id = $5
            ",
        )
        .bind(non_blank(input.allergen.as_deref()))
        .bind(&input.reaction)
        .bind(&input.severity)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update allergy: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_allergy(user_id, id).await
    }

    /// Delete an allergy owned by `user_id`; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_allergy(&self, user_id: &str, id: &str) -> AppResult<bool> {
        self.delete_owned("user_allergies", user_id, id).await
    }

    async fn get_allergy(&self, user_id: &str, id: &str) -> AppResult<Option<Allergy>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, allergen, reaction, severity, created_at
            FROM user_allergies WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get allergy: {e}")))?;

        Ok(row.as_ref().map(row_to_allergy))
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// List a user's conditions, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_conditions(&self, user_id: &str) -> AppResult<Vec<Condition>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, name, diagnosed_date, status, notes, created_at
            FROM user_conditions WHERE user_id = $1 ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conditions: {e}")))?;

        Ok(rows.iter().map(row_to_condition).collect())
    }

    /// Add a condition
    ///
    /// # Errors
    ///
    /// Returns an error if the name is missing or database operation fails
    pub async fn add_condition(
        &self,
        user_id: &str,
        input: &ConditionInput,
    ) -> AppResult<Condition> {
        let name = required(input.name.as_deref(), "Condition name is required")?;
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r"
            INSERT INTO user_conditions (id, user_id, name, diagnosed_date, status, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(&input.diagnosed_date)
        .bind(&input.status)
        .bind(&input.notes)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add condition: {e}")))?;

        self.get_condition(user_id, &id)
            .await?
            .ok_or_else(|| AppError::database("Condition could not be read back"))
    }

    /// Partially update a condition owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_condition(
        &self,
        user_id: &str,
        id: &str,
        input: &ConditionInput,
    ) -> AppResult<Option<Condition>> {
        let result = sqlx::query(
            r"
            UPDATE user_conditions SET
                name = COALESCE($1, name),
                diagnosed_date = COALESCE($2, diagnosed_date),
                status = COALESCE($3, status),
                notes = COALESCE($4, notes)
            WHERE id = $5 AND user_id = $6
            ",
        )
        .bind(non_blank(input.name.as_deref()))
        .bind(&input.diagnosed_date)
        .bind(&input.status)
        .bind(&input.notes)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update condition: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_condition(user_id, id).await
    }

    /// Delete a condition owned by `user_id`; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete_condition(&self, user_id: &str, id: &str) -> AppResult<bool> {
        self.delete_owned("user_conditions", user_id, id).await
    }

    async fn get_condition(&self, user_id: &str, id: &str) -> AppResult<Option<Condition>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, name, diagnosed_date, status, notes, created_at
            FROM user_conditions WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get condition: {e}")))?;

        Ok(row.as_ref().map(row_to_condition))
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Replace the named entries of one list wholesale (profile form submit)
    ///
    /// Blank names are skipped. Runs in a transaction so readers never see a
    /// half-replaced list.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn replace_names(
        &self,
        user_id: &str,
        list: ProfileList,
        names: &[String],
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        replace_names_on(&mut *tx, user_id, list, names).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit {list:?}: {e}")))
    }

    async fn delete_owned(&self, table: &str, user_id: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1 AND user_id = $2"))
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete from {table}: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Clear one list and insert the non-blank names on an open connection
///
/// Callers own the transaction boundary.
///
/// # Errors
///
/// Returns an error if database operation fails
pub(crate) async fn replace_names_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    list: ProfileList,
    names: &[String],
) -> AppResult<()> {
    let (table, column) = list.table_and_column();

    sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to clear {table}: {e}")))?;

    let now = now_rfc3339();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        sqlx::query(&format!(
            "INSERT INTO {table} (id, user_id, {column}, created_at) VALUES ($1, $2, $3, $4)"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(name)
        .bind(&now)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert into {table}: {e}")))?;
    }

    Ok(())
}

/// Which profile list a bulk operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileList {
    /// `user_medications`
    Medications,
    /// `user_allergies`
    Allergies,
    /// `user_conditions`
    Conditions,
}

impl ProfileList {
    const fn table_and_column(self) -> (&'static str, &'static str) {
        match self {
            Self::Medications => ("user_medications", "name"),
            Self::Allergies => ("user_allergies", "allergen"),
            Self::Conditions => ("user_conditions", "name"),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(value: Option<&'a str>, message: &str) -> AppResult<&'a str> {
    non_blank(value).ok_or_else(|| AppError::missing_field(message))
}

fn row_to_medication(row: &SqliteRow) -> Medication {
    Medication {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        dosage: row.get("dosage"),
        frequency: row.get("frequency"),
        prescribed_by: row.get("prescribed_by"),
        start_date: row.get("start_date"),
        created_at: row.get("created_at"),
    }
}

fn row_to_allergy(row: &SqliteRow) -> Allergy {
    Allergy {
        id: row.get("id"),
        user_id: row.get("user_id"),
        allergen: row.get("allergen"),
        reaction: row.get("reaction"),
        severity: row.get("severity"),
        created_at: row.get("created_at"),
    }
}

fn row_to_condition(row: &SqliteRow) -> Condition {
    Condition {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        diagnosed_date: row.get("diagnosed_date"),
        status: row.get("status"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}
