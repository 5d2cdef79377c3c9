//! The Provider Supervisor: status/session registries, session
//! lifecycle, health monitoring, restart coordination, and dispatch.
//!
//! This crate depends only on [`pgw_domain`] and the [`transport`]
//! port it defines — the concrete spawned-child-process implementation
//! lives in `pgw-transport`, kept separate so this crate's logic is
//! fully exercisable against an in-memory double.

pub mod backoff;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod restart;
pub mod session_registry;
pub mod status_registry;
pub mod supervisor;
pub mod tool_index;
pub mod transport;

pub use error::SupervisorError;
pub use supervisor::ProviderSupervisor;
pub use transport::{ChildProcess, ProviderTransport, RemoteTool, Session, TransportError};
