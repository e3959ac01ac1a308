// ABOUTME: Route module organization for the Karetek HTTP API
// ABOUTME: Domain route groups plus the shared JSON extractor and list-limit parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Route module for the Karetek server
//!
//! Each domain module contains route definitions and thin handlers that
//! delegate to the database managers and service layer.

/// Registration, login and current-user routes
pub mod auth;
/// Avatar speech, language detection and language listing routes
pub mod avatar;
/// AI chat and translation routes
pub mod chat;
/// Stored consultation routes
pub mod consultations;
/// Liveness check route
pub mod health;
/// Health metric routes
pub mod health_metrics;
/// Health record and profile child-list routes
pub mod health_records;
/// Profile read and update routes
pub mod profile;
/// Public usage stats route
pub mod stats;

pub use auth::{AuthRoutes, AuthService};
pub use avatar::AvatarRoutes;
pub use chat::ChatRoutes;
pub use consultations::ConsultationRoutes;
pub use health::HealthRoutes;
pub use health_metrics::HealthMetricRoutes;
pub use health_records::HealthRecordRoutes;
pub use profile::ProfileRoutes;
pub use stats::StatsRoutes;

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use karetek_core::errors::AppError;
use serde::de::DeserializeOwned;

/// JSON body extractor whose rejections use the API error envelope
///
/// `axum::Json` answers malformed bodies with plain text; clients of this API
/// always expect `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| AppError::invalid_input(rejection.body_text()))
    }
}

/// Parse a `?limit=` value, falling back to `default` and capping at `max`
///
/// Unparseable and zero values use the default.
#[must_use]
pub fn parse_limit(raw: Option<&str>, default: u32, max: u32) -> i64 {
    let limit = raw
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default);
    i64::from(limit.min(max))
}

/// Treat blank strings as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
