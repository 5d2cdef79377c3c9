//! Minimal rate-limited authenticator (spec §2 "ancillary slice", not
//! part of the Supervisor core).
//!
//! One token bucket per caller IP, refilled on a fixed interval and
//! guarding the HTTP front end as `axum` middleware. It never touches
//! `pgw-supervisor`'s internals — requests that exceed their bucket are
//! rejected with `429` before dispatch is ever reached.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use std::net::SocketAddr;

/// Requests allowed per bucket per refill interval.
const BUCKET_CAPACITY: u32 = 60;
/// How often a bucket refills to full capacity.
const REFILL_INTERVAL: Duration = Duration::from_secs(60);

struct Bucket {
    remaining: AtomicU32,
    window_started_at: std::sync::Mutex<Instant>,
}

impl Bucket {
    fn fresh() -> Self {
        Self {
            remaining: AtomicU32::new(BUCKET_CAPACITY),
            window_started_at: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Returns `true` if this call consumed a token; `false` if the
    /// bucket was already exhausted for the current window.
    fn try_consume(&self) -> bool {
        {
            let mut started = self
                .window_started_at
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if started.elapsed() >= REFILL_INTERVAL {
                self.remaining.store(BUCKET_CAPACITY, Ordering::SeqCst);
                *started = Instant::now();
            }
        }
        loop {
            let current = self.remaining.load(Ordering::SeqCst);
            if current == 0 {
                return false;
            }
            if self
                .remaining
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
    }
}

/// Per-IP token-bucket rate limiter, shared across the `axum` router via
/// [`axum::extract::State`].
#[derive(Clone)]
pub struct RateLimiter {
    buckets: std::sync::Arc<DashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    /// Build an empty limiter; buckets are created lazily per caller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: std::sync::Arc::new(DashMap::new()),
        }
    }

    fn allow(&self, ip: IpAddr) -> bool {
        self.buckets.entry(ip).or_insert_with(Bucket::fresh).try_consume()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// `axum` middleware enforcing the per-IP rate limit ahead of every
/// handler. Requests with no resolvable peer address (should not
/// happen behind `into_make_service_with_connect_info`) are allowed
/// through rather than rejected, since there is no caller identity to
/// penalize.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(ConnectInfo(addr)) = connect_info else {
        return next.run(request).await;
    };
    if limiter.allow(addr.ip()) {
        next.run(request).await
    } else {
        (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response()
    }
}
