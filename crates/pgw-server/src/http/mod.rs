//! The HTTP front end (spec §1 "out of scope for the core", §6.1
//! contract): `invoke`, `listTools`, `health`, wired through `axum`.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
