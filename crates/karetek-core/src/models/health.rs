// ABOUTME: User-owned health metric and health record row types
// ABOUTME: Metric values are stored as strings so compound readings (e.g. 120/80) fit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use serde::{Deserialize, Serialize};

/// A single tracked measurement (blood pressure, weight, glucose, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetric {
    /// Row ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Metric kind, e.g. `blood_pressure`
    pub metric_type: String,
    /// Stringified value
    pub value: String,
    /// Unit of measurement
    pub unit: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the reading was taken (RFC 3339)
    pub recorded_at: String,
    /// When the row was created (RFC 3339)
    pub created_at: String,
}

/// A dated entry in the user's medical history (visit, lab result, vaccination, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Row ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Record category, `general` by default
    pub record_type: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Date of the event (YYYY-MM-DD)
    pub date: String,
    /// Clinician or facility
    pub provider_name: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// When the row was created (RFC 3339)
    pub created_at: String,
}
