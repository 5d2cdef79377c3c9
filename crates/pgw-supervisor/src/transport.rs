//! The protocol collaborator port.
//!
//! The Session Lifecycle Manager speaks to providers exclusively through
//! these traits. Nothing in this crate knows that the real implementation
//! spawns a child process and exchanges JSON-RPC 2.0 over its stdio pipes
//! (see `pgw-transport`); unit tests substitute an in-memory double instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pgw_domain::ProviderConfig;
use serde_json::Value;

/// A tool advertised by a provider's `listTools` response.
#[derive(Debug, Clone)]
pub struct RemoteTool {
    /// Tool name as advertised by the provider.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON-Schema for the tool's input.
    pub input_schema: Value,
    /// JSON-Schema for the tool's output.
    pub output_schema: Value,
}

/// Failure surfaced while talking to a provider over the protocol.
#[derive(Debug, Clone)]
pub struct TransportError {
    /// Short machine-oriented reason, logged and wrapped by callers.
    pub message: String,
}

impl TransportError {
    /// Build a transport error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// A live, spawned-but-not-yet-handshaken (or already handshaken) OS
/// process backing a provider session.
///
/// Implementations must make every method safe to call after the process
/// has already exited; `is_alive` simply reports `false` and `terminate`/
/// `kill` become no-ops.
#[async_trait]
pub trait ChildProcess: Send + Sync {
    /// Whether the OS process is still running.
    async fn is_alive(&self) -> bool;

    /// Request a graceful shutdown (e.g. `SIGTERM`). Idempotent.
    async fn terminate(&self);

    /// Force termination (e.g. `SIGKILL`). Idempotent.
    async fn kill(&self);

    /// Block until the process has been reaped by the OS.
    async fn wait(&self);

    /// Narrow back to the concrete type that produced this handle.
    ///
    /// `pgw-transport`'s handshake step needs the real stdio pipes that
    /// only the concrete `ChildGuard` exposes; this is the seam that lets
    /// it get there without widening this trait (or `Session`) with a
    /// transport-specific method every other implementation would have to
    /// stub out.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// A live protocol session with a provider, established after the
/// process-level handshake completes (spec §4.3 step 4).
#[async_trait]
pub trait Session: Send + Sync {
    /// Send a liveness ping, bounded by `deadline`. `Ok(false)` means the
    /// provider answered but reported itself unhealthy; `Err` means no
    /// answer arrived in time or the session is already closed.
    async fn ping(&self, deadline: Duration) -> Result<bool, TransportError>;

    /// Fetch the provider's full tool catalogue.
    async fn list_tools(&self, deadline: Duration) -> Result<Vec<RemoteTool>, TransportError>;

    /// Invoke a single tool by name.
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
        deadline: Duration,
    ) -> Result<Value, TransportError>;

    /// Begin an orderly shutdown of the session. Idempotent; does not wait
    /// for completion (see [`Session::await_close`]).
    async fn close(&self);

    /// Resolve once the session has fully closed, whether initiated by
    /// [`Session::close`] or by the peer disconnecting unexpectedly.
    ///
    /// Returns `Some(reason)` when the close was unexpected (the
    /// disconnect watcher in spec §4.4), `None` for an orderly close.
    async fn await_close(&self) -> Option<String>;
}

/// Establishes new provider sessions. The one implementation shipped in
/// this workspace (`pgw-transport::RmcpTransport`) spawns a child process
/// and performs the MCP stdio handshake; tests use an in-memory double.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Spawn the provider's OS process. Must not perform the protocol
    /// handshake — the Session Lifecycle Manager publishes the resulting
    /// handle to the Session Registry *before* attempting the handshake,
    /// so a hang during handshake still leaves something to reap (spec
    /// §4.3 steps 2-3).
    async fn spawn(
        &self,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn ChildProcess>, TransportError>;

    /// Perform the protocol handshake over the already-spawned process.
    async fn handshake(
        &self,
        process: &Arc<dyn ChildProcess>,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Session>, TransportError>;
}
