// ABOUTME: Fixed-window per-IP rate limiting middleware for the /api surface
// ABOUTME: Tracks request counts in a sharded map and emits X-RateLimit headers and 429s
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Rate Limiting Middleware with HTTP Headers
//!
//! Each client IP gets a budget of requests per fixed window. Responses carry
//! the standard `X-RateLimit-*` headers; exhausted budgets produce a 429 with
//! `Retry-After`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use http::{HeaderMap, HeaderValue};
use karetek_core::errors::AppError;

use crate::config::RateLimitConfig;
use crate::logging::AppLogger;

/// HTTP header names for rate limiting
pub mod headers {
    /// HTTP header name for maximum requests allowed in the current window
    pub const X_RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
    /// HTTP header name for remaining requests in the current window
    pub const X_RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
    /// HTTP header name for seconds until the window resets
    pub const X_RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";
    /// HTTP header name for rate limit window duration in seconds
    pub const X_RATE_LIMIT_WINDOW: &str = "X-RateLimit-Window";
}

/// Map size above which stale windows are swept
const CLEANUP_THRESHOLD: usize = 10_000;

/// Outcome of one rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether the request must be rejected
    pub is_limited: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window after this one
    pub remaining: u32,
    /// Seconds until the window resets
    pub reset_after_secs: u64,
    /// Window length in seconds
    pub window_secs: u64,
}

/// Per-IP fixed-window rate limiter
///
/// Uses `DashMap` so concurrent requests from different clients only contend
/// on their own shard.
#[derive(Clone)]
pub struct ApiRateLimiter {
    /// Per-IP request tracking: IP -> (`request_count`, `window_start`)
    state: Arc<DashMap<IpAddr, (u32, Instant)>>,
    config: RateLimitConfig,
}

impl ApiRateLimiter {
    /// Create a limiter from configuration
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            state: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Whether limiting is switched on
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Count one request from `client_ip` and report whether it is allowed
    #[must_use]
    pub fn check(&self, client_ip: IpAddr) -> RateLimitStatus {
        self.check_at(client_ip, Instant::now())
    }

    fn check_at(&self, client_ip: IpAddr, now: Instant) -> RateLimitStatus {
        let limit = self.config.requests_per_window;
        let window = Duration::from_secs(self.config.window_seconds);

        let mut entry = self.state.entry(client_ip).or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        if now.duration_since(*window_start) >= window {
            *count = 0;
            *window_start = now;
        }

        let is_limited = *count >= limit;
        if !is_limited {
            *count += 1;
        }
        let remaining = limit.saturating_sub(*count);
        let elapsed = now.duration_since(*window_start);
        drop(entry);

        if self.state.len() > CLEANUP_THRESHOLD {
            self.cleanup_old_entries(now, window);
        }

        RateLimitStatus {
            is_limited,
            limit,
            remaining,
            reset_after_secs: window.saturating_sub(elapsed).as_secs(),
            window_secs: window.as_secs(),
        }
    }

    /// Remove windows that have already expired
    fn cleanup_old_entries(&self, now: Instant, window: Duration) {
        self.state
            .retain(|_ip, (_count, start)| now.duration_since(*start) < window);
    }
}

/// Create a `HeaderMap` with rate limit headers
#[must_use]
pub fn create_rate_limit_headers(status: &RateLimitStatus) -> HeaderMap {
    let mut map = HeaderMap::new();
    let pairs = [
        (headers::X_RATE_LIMIT_LIMIT, u64::from(status.limit)),
        (headers::X_RATE_LIMIT_REMAINING, u64::from(status.remaining)),
        (headers::X_RATE_LIMIT_RESET, status.reset_after_secs),
        (headers::X_RATE_LIMIT_WINDOW, status.window_secs),
    ];
    for (name, value) in pairs {
        if let Ok(header_value) = HeaderValue::from_str(&value.to_string()) {
            map.insert(name, header_value);
        }
    }
    map
}

/// Best-effort client address: socket peer, then `X-Forwarded-For`
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .or_else(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse().ok())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Axum middleware applying [`ApiRateLimiter`] to every request it wraps
pub async fn rate_limit_middleware(
    State(limiter): State<ApiRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let ip = client_ip(&request);
    let status = limiter.check(ip);
    let rate_headers = create_rate_limit_headers(&status);

    if status.is_limited {
        AppLogger::log_security_event(
            "rate_limit_exceeded",
            "low",
            &format!("{} requests per {}s", status.limit, status.window_secs),
            Some(&ip.to_string()),
        );
        let mut response = AppError::rate_limit_exceeded(status.reset_after_secs).into_response();
        response.headers_mut().extend(rate_headers);
        return response;
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(rate_headers);
    response
}
