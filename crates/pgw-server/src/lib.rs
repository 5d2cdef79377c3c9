//! The out-of-scope collaborator made concrete (spec §1): YAML
//! configuration loading, the `axum` HTTP front end, the rate-limited
//! authenticator, and the process-count gauge. `pgw-supervisor` itself
//! depends on none of this.

pub mod auth;
pub mod config;
pub mod http;
pub mod logging;
pub mod process_gauge;

pub use http::{build_router, AppState};
