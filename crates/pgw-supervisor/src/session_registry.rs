//! Session Registry (spec §4.2) plus the health-monitor bookkeeping maps
//! spec §5 folds into the same lock.
//!
//! A single `tokio::sync::RwLock` protects all four maps. Exclusive-lock
//! holders must never perform I/O or block on task completion while
//! holding the guard — see [`Self::take_monitor`], whose caller is
//! expected to cancel and await the returned handle *after* the guard is
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::transport::{ChildProcess, Session};

/// A running health-monitor task for one provider, plus the means to
/// stop it.
pub struct MonitorHandle {
    /// Signalled to ask the monitor loop to exit at its next checkpoint.
    pub cancel: CancellationToken,
    /// Resolves once the monitor loop has actually exited; doubles as
    /// the "exit signal" from spec §4.4.
    pub task: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Arc<dyn Session>>,
    processes: HashMap<String, Arc<dyn ChildProcess>>,
    monitors: HashMap<String, MonitorHandle>,
}

/// Registry of live sessions, child processes, and health-monitor
/// handles, keyed by provider name.
pub struct SessionRegistry {
    inner: RwLock<Inner>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Shared-lock read of a provider's session handle.
    pub async fn get_session(&self, name: &str) -> Option<Arc<dyn Session>> {
        self.inner.read().await.sessions.get(name).cloned()
    }

    /// Shared-lock read of a provider's process handle.
    pub async fn get_process(&self, name: &str) -> Option<Arc<dyn ChildProcess>> {
        self.inner.read().await.processes.get(name).cloned()
    }

    /// Publish a just-spawned process handle (spec §4.3 step 3), ahead
    /// of the handshake.
    pub async fn publish_process(&self, name: &str, process: Arc<dyn ChildProcess>) {
        self.inner
            .write()
            .await
            .processes
            .insert(name.to_owned(), process);
    }

    /// Remove a process handle without touching the session entry (used
    /// when the handshake itself fails, spec §4.3 step 5).
    pub async fn remove_process(&self, name: &str) -> Option<Arc<dyn ChildProcess>> {
        self.inner.write().await.processes.remove(name)
    }

    /// Publish a handshake-completed session (spec §4.3 step 6).
    pub async fn publish_session(&self, name: &str, session: Arc<dyn Session>) {
        self.inner
            .write()
            .await
            .sessions
            .insert(name.to_owned(), session);
    }

    /// Remove both the session and process entries for `name`, returning
    /// whatever was present. Used on catalogue failure (spec §4.3 step
    /// 8) and by the Restart Coordinator (spec §4.5 step 6).
    pub async fn take(&self, name: &str) -> (Option<Arc<dyn Session>>, Option<Arc<dyn ChildProcess>>) {
        let mut inner = self.inner.write().await;
        (inner.sessions.remove(name), inner.processes.remove(name))
    }

    /// Snapshot every `(name, session, process)` triple for shutdown
    /// (spec §4.3 `closeAll` step 1). Entries are also removed so
    /// concurrent dispatch sees an empty registry during teardown.
    pub async fn drain_all(&self) -> Vec<(String, Arc<dyn Session>, Option<Arc<dyn ChildProcess>>)> {
        let mut inner = self.inner.write().await;
        let sessions = std::mem::take(&mut inner.sessions);
        let mut out = Vec::with_capacity(sessions.len());
        for (name, session) in sessions {
            let process = inner.processes.remove(&name);
            out.push((name, session, process));
        }
        out
    }

    /// Take any existing monitor handle for `name` out of the registry,
    /// without awaiting it. The caller must `handle.cancel.cancel()` and
    /// await `handle.task` *after* releasing any lock it holds (spec
    /// §4.4 `start`, §9 "avoiding deadlock on monitor handoff").
    pub async fn take_monitor(&self, name: &str) -> Option<MonitorHandle> {
        self.inner.write().await.monitors.remove(name)
    }

    /// Publish a freshly spawned monitor handle.
    pub async fn publish_monitor(&self, name: &str, handle: MonitorHandle) {
        self.inner.write().await.monitors.insert(name.to_owned(), handle);
    }
}
