//! The `ProviderTransport` implementation that spawns real OS
//! processes and speaks the tool protocol over their stdio pipes.
//!
//! Everything here implements the ports `pgw-supervisor` defines in its
//! `transport` module; nothing in that crate depends on this one.

mod process;
mod protocol;
mod session;
mod transport;

pub use process::ChildGuard;
pub use session::RmcpSession;
pub use transport::RmcpTransport;
