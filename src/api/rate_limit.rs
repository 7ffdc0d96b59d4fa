//! Per-client request throttling.
//!
//! Each (client IP, tier) pair owns a bucket that refills continuously over
//! the configured window. The `Auth` tier guards login, registration and
//! first-run setup so password guessing is slow; everything else under
//! `/api` shares the looser `Api` tier.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiError;
use crate::config::RateLimitConfig;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    Api,
    Auth,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: u32,
    window_start: Instant,
    last_request: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<(IpAddr, RateLimitTier), Bucket>,
    config: RateLimitConfig,
    window: Duration,
}

/// Headers reported on every throttled route
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
    pub reset_after: u64,
}

/// Rejection: seconds until the client may retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfter {
    pub seconds: u64,
    pub limit: u32,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            window: Duration::from_secs(config.window_seconds.max(1)),
            config,
        }
    }

    pub fn limit_for(&self, tier: RateLimitTier) -> u32 {
        match tier {
            RateLimitTier::Api => self.config.api_requests_per_window,
            RateLimitTier::Auth => self.config.auth_requests_per_window,
        }
    }

    /// Consume one request from the bucket of `(ip, tier)`
    pub fn check(&self, ip: IpAddr, tier: RateLimitTier) -> Result<RateLimitInfo, RetryAfter> {
        self.check_at(ip, tier, Instant::now())
    }

    fn check_at(
        &self,
        ip: IpAddr,
        tier: RateLimitTier,
        now: Instant,
    ) -> Result<RateLimitInfo, RetryAfter> {
        let limit = self.limit_for(tier);
        if !self.config.enabled {
            return Ok(RateLimitInfo {
                remaining: limit,
                limit,
                reset_after: 0,
            });
        }

        let mut bucket = self.buckets.entry((ip, tier)).or_insert_with(|| Bucket {
            tokens: limit,
            window_start: now,
            last_request: now,
        });

        let elapsed = now.saturating_duration_since(bucket.window_start);
        if elapsed >= self.window {
            bucket.tokens = limit;
            bucket.window_start = now;
        } else {
            // Refill proportionally to the time since the previous request
            let idle = now.saturating_duration_since(bucket.last_request);
            let per_second = limit as f64 / self.window.as_secs_f64();
            let refill = (idle.as_secs_f64() * per_second) as u32;
            bucket.tokens = bucket.tokens.saturating_add(refill).min(limit);
        }
        bucket.last_request = now;

        let reset_after = self
            .window
            .saturating_sub(now.saturating_duration_since(bucket.window_start))
            .as_secs();
        if bucket.tokens == 0 {
            return Err(RetryAfter {
                seconds: reset_after.max(1),
                limit,
            });
        }

        bucket.tokens -= 1;
        Ok(RateLimitInfo {
            remaining: bucket.tokens,
            limit,
            reset_after,
        })
    }

    /// Forget buckets idle for more than two windows
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let keep_for = self.window * 2;
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_request) < keep_for);
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer, then loopback.
fn client_ip(request: &Request<Body>) -> IpAddr {
    let headers = request.headers();
    let forwarded: Option<IpAddr> = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());
    let real_ip = || header_str(headers, "x-real-ip").and_then(|v| v.trim().parse::<IpAddr>().ok());
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    forwarded
        .or_else(real_ip)
        .or_else(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn rate_limit_api(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    throttle(&state.rate_limiter, request, next, RateLimitTier::Api).await
}

pub async fn rate_limit_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    throttle(&state.rate_limiter, request, next, RateLimitTier::Auth).await
}

async fn throttle(
    limiter: &RateLimiter,
    request: Request<Body>,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let ip = client_ip(&request);

    match limiter.check(ip, tier) {
        Ok(info) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(info.remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(info.reset_after));
            response
        }
        Err(retry) => {
            tracing::warn!(%ip, ?tier, "Rate limit exceeded");
            let mut response = ApiError::rate_limited(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry.seconds
            ))
            .into_response();
            let headers = response.headers_mut();
            headers.insert("retry-after", HeaderValue::from(retry.seconds));
            headers.insert("x-ratelimit-limit", HeaderValue::from(retry.limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("x-ratelimit-reset", HeaderValue::from(retry.seconds));
            response
        }
    }
}

/// Spawn the periodic purge of idle buckets
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    if cleanup_interval_secs == 0 {
        return;
    }
    tokio::spawn(async move {
        let interval = Duration::from_secs(cleanup_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                entries = rate_limiter.entry_count(),
                "Rate limiter cleanup complete"
            );
        }
    });
}
