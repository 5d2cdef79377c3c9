//! Health Monitor (spec §4.4): per-provider periodic-ping loop with a
//! three-strike failure policy and monitor handoff free of deadlock
//! (spec §9 "avoiding deadlock on monitor handoff").

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use pgw_domain::{ProviderStatus, Tunables};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::session_registry::{MonitorHandle, SessionRegistry};
use crate::status_registry::StatusRegistry;

/// Per-provider counters preserved across monitor restarts (spec §3
/// `HealthState`, §9 "monitor preservation across restarts").
#[derive(Default)]
struct HealthState {
    consecutive_failures: u32,
}

/// A callback invoked when a provider crosses the failure threshold.
/// Installed by the Supervisor facade and delegates to the Restart
/// Coordinator.
pub type CrashCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Owns the per-provider [`HealthState`] table and spawns/cancels
/// monitor loops.
pub struct HealthMonitor {
    sessions: Arc<SessionRegistry>,
    status: Arc<StatusRegistry>,
    tunables: Tunables,
    state: Mutex<HashMap<String, HealthState>>,
    crash_callback: Mutex<Option<CrashCallback>>,
}

impl HealthMonitor {
    /// Build a monitor around the given collaborators and tunables.
    #[must_use]
    pub fn new(sessions: Arc<SessionRegistry>, status: Arc<StatusRegistry>, tunables: Tunables) -> Self {
        Self {
            sessions,
            status,
            tunables,
            state: Mutex::new(HashMap::new()),
            crash_callback: Mutex::new(None),
        }
    }

    /// Install the callback invoked when a provider is declared `Crashed`
    /// by the three-strike rule.
    pub fn set_crash_callback(&self, callback: CrashCallback) {
        *self.crash_callback.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(callback);
    }

    /// Start (or restart) the monitor loop for `name` (spec §4.4
    /// `start`).
    ///
    /// If a monitor for `name` already exists, its cancellation token is
    /// signalled and its exit is awaited — with the registry lock
    /// released for the wait, so the exiting monitor can still acquire
    /// the lock to deregister itself.
    pub async fn start(self: &Arc<Self>, name: String) {
        if let Some(previous) = self.sessions.take_monitor(&name).await {
            previous.cancel.cancel();
            if timeout(Duration::from_secs(5), previous.task).await.is_err() {
                pgw_domain::warn!(
                    "health",
                    "timed out waiting for previous monitor to exit",
                    name.clone()
                );
            }
        }

        {
            let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            state.entry(name.clone()).or_default();
        }

        let cancel = CancellationToken::new();
        let this = Arc::clone(self);
        let loop_name = name.clone();
        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            this.run_loop(loop_name, loop_cancel).await;
        });

        self.sessions
            .publish_monitor(&name, MonitorHandle { cancel, task })
            .await;
    }

    async fn run_loop(self: Arc<Self>, name: String, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(self.tunables.health_check_interval()) => {}
            }
            if cancel.is_cancelled() {
                return;
            }

            let Some(session) = self.sessions.get_session(&name).await else {
                return;
            };

            let deadline = self.tunables.ping_deadline();
            let ping_ok = matches!(session.ping(deadline).await, Ok(true));
            let currently_restarting = self.status.get(&name) == ProviderStatus::Restarting;

            if ping_ok {
                let had_failures = {
                    let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    let entry = state.entry(name.clone()).or_default();
                    let had = entry.consecutive_failures > 0;
                    entry.consecutive_failures = 0;
                    had
                };
                if had_failures {
                    pgw_domain::info!("health", "provider recovered", name.clone());
                    self.status.reset_attempts(&name);
                }
                continue;
            }

            if currently_restarting {
                // Count-wise no-op while a restart is already in flight.
                continue;
            }

            let crossed_threshold = {
                let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let entry = state.entry(name.clone()).or_default();
                entry.consecutive_failures =
                    (entry.consecutive_failures + 1).min(Tunables::FAILURE_THRESHOLD);
                entry.consecutive_failures >= Tunables::FAILURE_THRESHOLD
            };

            if crossed_threshold
                && self
                    .status
                    .compare_and_swap(&name, ProviderStatus::Available, ProviderStatus::Crashed)
            {
                pgw_domain::warn!("health", "provider crossed failure threshold", name.clone());
                let callback = self
                    .crash_callback
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .clone();
                if let Some(callback) = callback {
                    callback(name.clone());
                }
            }
        }
    }
}
