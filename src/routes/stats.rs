// ABOUTME: Public usage stats route for the landing page counters
// ABOUTME: Never fails; missing or zero counts are replaced by fixed fallback figures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::database::UsageCounts;
use crate::resources::ServerResources;

/// Stats routes
pub struct StatsRoutes;

impl StatsRoutes {
    /// Create the stats route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/stats", get(Self::handle_stats))
            .with_state(resources)
    }

    /// Return the usage counters
    async fn handle_stats(State(resources): State<Arc<ServerResources>>) -> Json<UsageCounts> {
        Json(resources.database.stats().usage_counts().await)
    }
}
