//! `ProviderTransport` implementation: spawn a child process, then
//! perform the MCP-style handshake over its piped stdio.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pgw_domain::ProviderConfig;
use pgw_supervisor::{ChildProcess, ProviderTransport, Session, TransportError};

use crate::process::ChildGuard;
use crate::session::RmcpSession;

/// Bound on how long the `initialize` handshake itself may take, kept
/// separate from (and shorter than) the provider's configured
/// tool-call timeout.
const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(10);

/// Spawns real OS processes and speaks the tool protocol over their
/// stdio pipes via [`RmcpSession`].
#[derive(Default)]
pub struct RmcpTransport;

impl RmcpTransport {
    /// Build a transport. Stateless; every provider gets its own
    /// process and session.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl ProviderTransport for RmcpTransport {
    async fn spawn(&self, config: &ProviderConfig) -> Result<Arc<dyn ChildProcess>, TransportError> {
        let guard = ChildGuard::spawn(config)?;
        Ok(guard as Arc<dyn ChildProcess>)
    }

    async fn handshake(
        &self,
        process: &Arc<dyn ChildProcess>,
        _config: &ProviderConfig,
    ) -> Result<Arc<dyn Session>, TransportError> {
        let guard = process
            .as_any()
            .downcast_ref::<ChildGuard>()
            .ok_or_else(|| TransportError::new("handshake called with a non-child-guard process handle"))?;
        let (stdin, stdout) = guard.take_stdio().await?;
        let session = RmcpSession::handshake(stdin, stdout, HANDSHAKE_DEADLINE).await?;
        Ok(session as Arc<dyn Session>)
    }
}
