// ABOUTME: Aggregate row counts for the public landing-page stats
// ABOUTME: Failed or zero counts are replaced by fixed marketing fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use karetek_core::constants::stats::{
    FALLBACK_ACTIVE_USERS, FALLBACK_HEALTH_METRICS, FALLBACK_TOTAL_CONSULTATIONS,
};
use karetek_core::errors::AppResult;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

use super::{ConsultationManager, HealthMetricManager, UserManager};

/// Public usage figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounts {
    /// Consultations held
    pub total_consultations: i64,
    /// Registered users
    pub active_users: i64,
    /// Health metrics recorded
    pub health_metrics_tracked: i64,
}

impl UsageCounts {
    /// Combine raw counts, substituting the fallback for any failed or zero count
    #[must_use]
    pub fn with_fallbacks(
        consultations: AppResult<i64>,
        users: AppResult<i64>,
        metrics: AppResult<i64>,
    ) -> Self {
        Self {
            total_consultations: or_fallback("consultations", consultations, FALLBACK_TOTAL_CONSULTATIONS),
            active_users: or_fallback("users", users, FALLBACK_ACTIVE_USERS),
            health_metrics_tracked: or_fallback("health_metrics", metrics, FALLBACK_HEALTH_METRICS),
        }
    }
}

fn or_fallback(table: &str, count: AppResult<i64>, fallback: i64) -> i64 {
    match count {
        Ok(n) if n > 0 => n,
        Ok(_) => fallback,
        Err(e) => {
            warn!("Stats count for {table} failed, using fallback: {e}");
            fallback
        }
    }
}

/// Stats queries
#[derive(Clone)]
pub struct StatsManager {
    pool: SqlitePool,
}

impl StatsManager {
    /// Create a new stats manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Current usage figures; never fails
    pub async fn usage_counts(&self) -> UsageCounts {
        let consultation_manager = ConsultationManager::new(self.pool.clone());
        let user_manager = UserManager::new(self.pool.clone());
        let metric_manager = HealthMetricManager::new(self.pool.clone());
        let consultations = consultation_manager.count();
        let users = user_manager.count();
        let metrics = metric_manager.count();
        let (consultations, users, metrics) = tokio::join!(consultations, users, metrics);
        UsageCounts::with_fallbacks(consultations, users, metrics)
    }
}
