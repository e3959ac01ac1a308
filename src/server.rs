// ABOUTME: HTTP server assembly: merges route groups, applies middleware layers and serves
// ABOUTME: The /api tree sits behind the per-IP rate limiter; /health and /media do not
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # HTTP Server
//!
//! Layer order (outermost first): request id, tracing, CORS, body limit.
//! Rate limiting wraps only the `/api` routes.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use karetek_core::constants::limits::MAX_REQUEST_BODY_BYTES;
use karetek_core::errors::ErrorCode;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::StorageBackend;
use crate::middleware::{
    create_request_span, rate_limit_middleware, setup_cors, RequestIdGenerator,
    REQUEST_ID_HEADER,
};
use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, AvatarRoutes, ChatRoutes, ConsultationRoutes, HealthMetricRoutes,
    HealthRecordRoutes, HealthRoutes, ProfileRoutes, StatsRoutes,
};

/// Path prefix under which locally stored audio is served
pub const MEDIA_PATH: &str = "/media";

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ProfileRoutes::routes(Arc::clone(&resources)))
        .merge(HealthMetricRoutes::routes(Arc::clone(&resources)))
        .merge(HealthRecordRoutes::routes(Arc::clone(&resources)))
        .merge(ChatRoutes::routes(Arc::clone(&resources)))
        .merge(ConsultationRoutes::routes(Arc::clone(&resources)))
        .merge(AvatarRoutes::routes(Arc::clone(&resources)))
        .merge(StatsRoutes::routes(Arc::clone(&resources)))
        .route_layer(from_fn_with_state(
            resources.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let mut app = Router::new().merge(HealthRoutes::routes()).merge(api);

    let storage = &resources.config.storage;
    if storage.backend == StorageBackend::Local {
        app = app.nest_service(MEDIA_PATH, ServeDir::new(&storage.local_dir));
    }

    app.fallback(route_not_found)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(setup_cors(&resources.config.security))
        .layer(TraceLayer::new_for_http().make_span_with(create_request_span))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, RequestIdGenerator))
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": ErrorCode::ResourceNotFound,
                "message": "Route not found",
            }
        })),
    )
        .into_response()
}

/// Bind to `port` and serve until Ctrl+C or SIGTERM
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails
pub async fn run_server(resources: Arc<ServerResources>, port: u16) -> Result<()> {
    let app = build_router(resources);

    let address = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Karetek server listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
