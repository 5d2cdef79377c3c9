//! `ChildProcess` backed by a real, spawned OS process.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pgw_domain::ProviderConfig;
use pgw_supervisor::{ChildProcess, TransportError};
use tokio::process::{Child, Command};
use tokio::sync::Mutex as AsyncMutex;

/// Send `SIGTERM` to request a graceful shutdown. `tokio::process` has
/// no portable API for anything short of `SIGKILL`; `nix` gives a safe
/// wrapper over the raw syscall.
#[cfg(unix)]
fn send_sigterm(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) {}

/// Wraps a [`tokio::process::Child`], making liveness queries and
/// termination requests idempotent and safe to call after the process
/// has already exited.
pub struct ChildGuard {
    child: AsyncMutex<Child>,
    reaped: AtomicBool,
}

impl ChildGuard {
    /// Spawn `config.executable` with the given environment, piping
    /// stdin/stdout for the protocol handshake and leaving stderr
    /// inherited so provider diagnostics reach the gateway's own logs.
    pub fn spawn(config: &ProviderConfig) -> Result<Arc<Self>, TransportError> {
        let mut command = Command::new(&config.executable);
        command
            .args(&config.args)
            .env_clear()
            .envs(config.envs.iter().cloned())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| TransportError::new(format!("failed to spawn '{}': {e}", config.executable)))?;

        Ok(Arc::new(Self {
            child: AsyncMutex::new(child),
            reaped: AtomicBool::new(false),
        }))
    }

    /// Take ownership of the child's stdin/stdout pipes, leaving the
    /// `Child` handle behind purely for lifecycle control. Must be
    /// called exactly once, immediately after [`Self::spawn`], before
    /// the handshake begins.
    pub async fn take_stdio(&self) -> Result<(tokio::process::ChildStdin, tokio::process::ChildStdout), TransportError> {
        let mut child = self.child.lock().await;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::new("child stdin already taken"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::new("child stdout already taken"))?;
        Ok((stdin, stdout))
    }
}

#[async_trait]
impl ChildProcess for ChildGuard {
    async fn is_alive(&self) -> bool {
        if self.reaped.load(Ordering::SeqCst) {
            return false;
        }
        let mut child = self.child.lock().await;
        match child.try_wait() {
            Ok(Some(_)) => {
                self.reaped.store(true, Ordering::SeqCst);
                false
            }
            Ok(None) => true,
            Err(_) => false,
        }
    }

    async fn terminate(&self) {
        let mut child = self.child.lock().await;
        // Closing stdin first: many stdio tool-protocol servers exit on
        // EOF, letting them wind down before the signal even lands.
        drop(child.stdin.take());
        if let Some(pid) = child.id() {
            send_sigterm(pid);
        }
    }

    async fn kill(&self) {
        let mut child = self.child.lock().await;
        if child.start_kill().is_ok() {
            self.reaped.store(false, Ordering::SeqCst);
        }
    }

    async fn wait(&self) {
        let mut child = self.child.lock().await;
        let _ = child.wait().await;
        self.reaped.store(true, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
