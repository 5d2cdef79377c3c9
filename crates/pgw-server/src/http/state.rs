//! Shared `axum` application state.

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;
use pgw_supervisor::ProviderSupervisor;

use crate::auth::RateLimiter;

/// State handed to every handler: the Supervisor facade, process start
/// time (for `health`'s `uptime`), the rate limiter, and the Prometheus
/// metrics handle backing `GET /metrics`.
#[derive(Clone)]
pub struct AppState {
    /// The single entry point into the Provider Supervisor.
    pub supervisor: Arc<ProviderSupervisor>,
    /// When the gateway process started, for `health`'s `uptime` field.
    pub started_at: Instant,
    /// Per-IP rate limiter, installed as middleware in [`super::router::build_router`].
    pub rate_limiter: RateLimiter,
    /// Renders the process-count gauge and any other registered metrics.
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build the shared state around a freshly constructed supervisor.
    #[must_use]
    pub fn new(supervisor: Arc<ProviderSupervisor>, metrics_handle: PrometheusHandle) -> Self {
        Self {
            supervisor,
            started_at: Instant::now(),
            rate_limiter: RateLimiter::new(),
            metrics_handle,
        }
    }
}
