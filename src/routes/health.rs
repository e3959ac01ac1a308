// ABOUTME: Health check route handler for liveness probes and load balancers
// ABOUTME: Served outside the /api rate limit so monitoring is never throttled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! Health check routes for service monitoring

use karetek_core::constants::endpoints::HEALTH_CHECK;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes() -> axum::Router {
        use axum::{routing::get, Json, Router};

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "ok",
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        Router::new().route(HEALTH_CHECK, get(health_handler))
    }
}
