//! Fixed-window rate limiting keyed by (route, client IP).
//!
//! State is in-memory and per-process: it resets on restart and is not shared
//! between instances. A multi-instance deployment needs an external counter
//! store in front of this.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::AppError;

/// A ceiling of `max_requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimit {
    pub const fn per_second(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(1),
        }
    }

    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

/// Applies to routes without their own ceiling.
pub const DEFAULT_LIMIT: RateLimit = RateLimit::per_minute(30);
pub const HEALTH_LIMIT: RateLimit = RateLimit::per_second(10);
pub const SUMMARIZE_LIMIT: RateLimit = RateLimit::per_minute(10);
pub const SUMMARIZE_FILE_LIMIT: RateLimit = RateLimit::per_minute(5);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    window: Duration,
    count: u32,
}

/// Shared counter table. Cloning shares the same table.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    buckets: Arc<DashMap<(&'static str, IpAddr), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request and returns whether it is within the ceiling.
    /// The entry guard holds the shard lock, so check-and-increment is atomic
    /// per key.
    pub fn check(&self, route: &'static str, ip: IpAddr, limit: RateLimit) -> bool {
        let now = Instant::now();
        let mut bucket = self.buckets.entry((route, ip)).or_insert(Window {
            started: now,
            window: limit.window,
            count: 0,
        });

        if now.duration_since(bucket.started) >= limit.window {
            bucket.started = now;
            bucket.window = limit.window;
            bucket.count = 0;
        }

        if bucket.count >= limit.max_requests {
            return false;
        }
        bucket.count += 1;
        true
    }

    /// Drops buckets whose window has elapsed.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.started) < bucket.window);
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Sweeps expired buckets every `period` until the runtime shuts down.
    pub fn spawn_sweeper(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                limiter.sweep();
                debug!(buckets = limiter.len(), "rate-limit buckets swept");
            }
        })
    }
}

/// Middleware state: which bucket family and ceiling a route uses.
#[derive(Debug, Clone)]
pub struct RouteLimit {
    pub limiter: RateLimiter,
    pub route: &'static str,
    pub limit: RateLimit,
}

/// Rejects the request with 429 once the caller's address exceeds the
/// route's ceiling. Requests without connection info share one bucket.
pub async fn enforce_rate_limit(
    State(route_limit): State<RouteLimit>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !route_limit
        .limiter
        .check(route_limit.route, ip, route_limit.limit)
    {
        warn!(route = route_limit.route, %ip, "rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test(start_paused = true)]
    async fn test_n_plus_first_request_is_rejected() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::per_minute(5);
        for _ in 0..5 {
            assert!(limiter.check("/r", ip(1), limit));
        }
        assert!(!limiter.check("/r", ip(1), limit));
        assert!(!limiter.check("/r", ip(1), limit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::per_second(2);
        assert!(limiter.check("/r", ip(1), limit));
        assert!(limiter.check("/r", ip(1), limit));
        assert!(!limiter.check("/r", ip(1), limit));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(limiter.check("/r", ip(1), limit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_buckets_are_per_address_and_route() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::per_minute(1);
        assert!(limiter.check("/a", ip(1), limit));
        assert!(!limiter.check("/a", ip(1), limit));
        assert!(limiter.check("/a", ip(2), limit));
        assert!(limiter.check("/b", ip(1), limit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_expired_buckets() {
        let limiter = RateLimiter::new();
        limiter.check("/fast", ip(1), RateLimit::per_second(10));
        limiter.check("/slow", ip(1), RateLimit::per_minute(10));
        assert_eq!(limiter.len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        limiter.sweep();
        assert_eq!(limiter.len(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        limiter.sweep();
        assert_eq!(limiter.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_do_not_undercount() {
        let limiter = RateLimiter::new();
        let limit = RateLimit::per_minute(50);
        let mut handles = Vec::new();
        for _ in 0..200 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.check("/r", ip(7), limit)
            }));
        }
        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 50);
    }
}
