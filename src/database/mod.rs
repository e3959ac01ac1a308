// ABOUTME: SQLite connection pool, schema migrations and per-table managers
// ABOUTME: Every user-owned query filters on user_id; managers share one pool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Database
//!
//! `Database` owns the `SqlitePool` and hands out lightweight managers, one per
//! table family. Managers return `AppResult` and never expose SQL errors to
//! callers beyond the `DATABASE_ERROR` code.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Consultation session persistence
pub mod consultations;
/// Health metric CRUD
pub mod health_metrics;
/// Health record entries
pub mod health_records;
/// Medications, allergies and conditions child tables
pub mod profile_lists;
/// Aggregate counts for the public stats endpoint
pub mod stats;
/// User accounts and profile fields
pub mod users;

pub use consultations::{ConsultationManager, UpsertOutcome};
pub use health_metrics::{HealthMetricManager, MetricUpdate, NewHealthMetric};
pub use health_records::{HealthRecordManager, NewHealthRecord, RecordUpdate};
pub use profile_lists::{
    AllergyInput, ConditionInput, MedicationInput, ProfileList, ProfileListManager,
};
pub use stats::{StatsManager, UsageCounts};
pub use users::UserManager;

/// Schema, one statement per entry, applied in order at start-up
const MIGRATIONS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        date_of_birth TEXT,
        gender TEXT,
        phone_number TEXT,
        address TEXT,
        city TEXT,
        state TEXT,
        zip_code TEXT,
        country TEXT,
        blood_group TEXT,
        height REAL,
        weight REAL,
        emergency_contact_name TEXT,
        emergency_contact_phone TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS user_medications (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        dosage TEXT,
        frequency TEXT,
        prescribed_by TEXT,
        start_date TEXT,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_user_medications_user ON user_medications(user_id)",
    r"
    CREATE TABLE IF NOT EXISTS user_allergies (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        allergen TEXT NOT NULL,
        reaction TEXT,
        severity TEXT,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_user_allergies_user ON user_allergies(user_id)",
    r"
    CREATE TABLE IF NOT EXISTS user_conditions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        diagnosed_date TEXT,
        status TEXT,
        notes TEXT,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_user_conditions_user ON user_conditions(user_id)",
    r"
    CREATE TABLE IF NOT EXISTS consultations (
        id TEXT PRIMARY KEY,
        user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
        session_id TEXT NOT NULL UNIQUE,
        language TEXT NOT NULL,
        messages TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_consultations_user ON consultations(user_id, created_at)",
    r"
    CREATE TABLE IF NOT EXISTS health_metrics (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        metric_type TEXT NOT NULL,
        value TEXT NOT NULL,
        unit TEXT NOT NULL,
        notes TEXT,
        recorded_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_health_metrics_user ON health_metrics(user_id, recorded_at)",
    r"
    CREATE TABLE IF NOT EXISTS health_records (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        record_type TEXT NOT NULL DEFAULT 'general',
        title TEXT NOT NULL,
        description TEXT,
        date TEXT NOT NULL,
        provider_name TEXT,
        notes TEXT,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_health_records_user ON health_records(user_id, date)",
];

/// Shared database handle
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `database_url` and run migrations
    ///
    /// In-memory databases are pinned to a single long-lived connection so
    /// every query sees the same schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration statement fails
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let is_memory = database_url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .acquire_timeout(Duration::from_secs(10))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Migration failed: {}", statement.trim()))?;
        }
        info!("Database migrations applied ({} statements)", MIGRATIONS.len());
        Ok(())
    }

    /// User account operations
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }

    /// Medications, allergies and conditions
    #[must_use]
    pub fn profile_lists(&self) -> ProfileListManager {
        ProfileListManager::new(self.pool.clone())
    }

    /// Health metric operations
    #[must_use]
    pub fn health_metrics(&self) -> HealthMetricManager {
        HealthMetricManager::new(self.pool.clone())
    }

    /// Health record operations
    #[must_use]
    pub fn health_records(&self) -> HealthRecordManager {
        HealthRecordManager::new(self.pool.clone())
    }

    /// Consultation session operations
    #[must_use]
    pub fn consultations(&self) -> ConsultationManager {
        ConsultationManager::new(self.pool.clone())
    }

    /// Aggregate counts
    #[must_use]
    pub fn stats(&self) -> StatsManager {
        StatsManager::new(self.pool.clone())
    }
}

/// Current time as stored in timestamp columns
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
