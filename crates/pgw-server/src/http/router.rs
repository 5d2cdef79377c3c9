//! Assembles the `axum` `Router`: routes, tracing, and the rate-limit
//! middleware (spec §1 HTTP front end, §2 rate-limited authenticator).

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::auth::rate_limit;

/// Build the complete router for the provider gateway.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let rate_limiter = state.rate_limiter.clone();
    Router::new()
        .route("/invoke", post(handlers::invoke))
        .route("/tools", get(handlers::list_tools))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
