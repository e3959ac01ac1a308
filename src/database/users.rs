// ABOUTME: Database operations for user accounts and demographic profile fields
// ABOUTME: Handles registration inserts, lookups by email/id and partial profile updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use karetek_core::errors::{AppError, AppResult};
use karetek_core::models::{NewUser, PatientProfile, ProfileUpdate, User};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::now_rfc3339;
use super::profile_lists::{replace_names_on, ProfileList};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, date_of_birth, \
     gender, phone_number, address, city, state, zip_code, country, blood_group, height, weight, \
     emergency_contact_name, emergency_contact_phone, created_at, updated_at";

/// User database operations manager
#[derive(Clone)]
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a new user manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database error
    pub async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();

        let result = sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, first_name, last_name, date_of_birth,
                               gender, phone_number, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ",
        )
        .bind(&id)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.date_of_birth)
        .bind(&new_user.gender)
        .bind(&new_user.phone_number)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(AppError::already_exists(
                    "User with this email already exists",
                ));
            }
            Err(e) => return Err(AppError::database(format!("Failed to create user: {e}"))),
        }

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| AppError::database("Created user could not be read back"))
    }

    /// Find a user by (already lowercased) email
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up user: {e}")))?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Find a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        Ok(row.as_ref().map(row_to_user))
    }

    /// Apply a partial profile update; absent fields keep their values
    ///
    /// Returns `false` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> AppResult<bool> {
        let result = profile_update_query(user_id, update)
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply the demographic fields and any list replacements in one transaction
    ///
    /// Either every change is committed or none is. Returns `false` (and writes
    /// nothing) when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement or the commit fails
    pub async fn update_profile_with_lists(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let result = profile_update_query(user_id, update)
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        let replacements = [
            (ProfileList::Conditions, &update.medical_conditions),
            (ProfileList::Allergies, &update.allergies),
            (ProfileList::Medications, &update.current_medications),
        ];
        for (list, names) in replacements {
            if let Some(names) = names {
                replace_names_on(&mut *tx, user_id, list, names).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit profile update: {e}")))?;
        Ok(true)
    }

    /// Load the restricted projection used to personalize chat
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_patient_basics(&self, user_id: &str) -> AppResult<Option<PatientProfile>> {
        let row = sqlx::query(
            r"
            SELECT first_name, last_name, date_of_birth, gender, blood_group, height, weight
            FROM users WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load patient profile: {e}")))?;

        Ok(row.map(|row| PatientProfile {
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            date_of_birth: row.get("date_of_birth"),
            gender: row.get("gender"),
            blood_group: row.get("blood_group"),
            height: row.get("height"),
            weight: row.get("weight"),
            ..PatientProfile::default()
        }))
    }

    /// Total number of registered users
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))
    }
}

fn profile_update_query<'a>(user_id: &str, update: &ProfileUpdate) -> QueryBuilder<'a, Sqlite> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = ");
    builder.push_bind(now_rfc3339());

    let text_fields = [
        ("first_name", &update.first_name),
        ("last_name", &update.last_name),
        ("date_of_birth", &update.date_of_birth),
        ("gender", &update.gender),
        ("phone_number", &update.phone_number),
        ("address", &update.address),
        ("city", &update.city),
        ("state", &update.state),
        ("zip_code", &update.zip_code),
        ("country", &update.country),
        ("blood_group", &update.blood_group),
        ("emergency_contact_name", &update.emergency_contact_name),
        ("emergency_contact_phone", &update.emergency_contact_phone),
    ];
    for (column, value) in text_fields {
        if let Some(value) = value {
            builder.push(format!(", {column} = ")).push_bind(value.clone());
        }
    }
    for (column, value) in [("height", update.height), ("weight", update.weight)] {
        if let Some(value) = value {
            builder.push(format!(", {column} = ")).push_bind(value);
        }
    }

    builder.push(" WHERE id = ").push_bind(user_id.to_owned());
    builder
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        date_of_birth: row.get("date_of_birth"),
        gender: row.get("gender"),
        phone_number: row.get("phone_number"),
        address: row.get("address"),
        city: row.get("city"),
        state: row.get("state"),
        zip_code: row.get("zip_code"),
        country: row.get("country"),
        blood_group: row.get("blood_group"),
        height: row.get("height"),
        weight: row.get("weight"),
        emergency_contact_name: row.get("emergency_contact_name"),
        emergency_contact_phone: row.get("emergency_contact_phone"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
