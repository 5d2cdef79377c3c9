//! Restart Coordinator (spec §4.5): synchronous preconditions, then a
//! detached asynchronous teardown/reconnect body.

use std::sync::Arc;

use pgw_domain::{ProviderConfig, ProviderStatus, RestartPolicy, Tunables};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::backoff::calculate_backoff;
use crate::health::HealthMonitor;
use crate::lifecycle::LifecycleManager;
use crate::session_registry::SessionRegistry;
use crate::status_registry::StatusRegistry;

/// Drives the crash -> backoff -> reconnect -> monitor state machine for
/// one provider at a time (invariant I4: at most one coordinator task
/// per provider).
pub struct RestartCoordinator {
    sessions: Arc<SessionRegistry>,
    status: Arc<StatusRegistry>,
    lifecycle: Arc<LifecycleManager>,
    health: Arc<HealthMonitor>,
    policy: RestartPolicy,
    shutdown: CancellationToken,
}

impl RestartCoordinator {
    /// Build a coordinator around the given collaborators.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionRegistry>,
        status: Arc<StatusRegistry>,
        lifecycle: Arc<LifecycleManager>,
        health: Arc<HealthMonitor>,
        policy: RestartPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sessions,
            status,
            lifecycle,
            health,
            policy,
            shutdown,
        }
    }

    /// Entry point, installed as the Health Monitor's crash callback.
    /// Returns promptly; the actual work is a detached task (spec §4.5
    /// "Restart is always asynchronous").
    pub fn restart(self: &Arc<Self>, config: ProviderConfig) {
        let name = config.name.clone();

        // Precondition 1: policy gate.
        if self.policy != RestartPolicy::OnFailure {
            self.status.set(&name, ProviderStatus::Crashed);
            pgw_domain::info!(
                "restart",
                "restart policy is not on-failure, leaving provider crashed",
                name
            );
            return;
        }

        // Precondition 2: attempt budget.
        if self.status.get_attempts(&name) >= Tunables::MAX_RESTART_ATTEMPTS {
            self.status.set(&name, ProviderStatus::Crashed);
            pgw_domain::warn!("restart", "restart attempts exhausted", name);
            return;
        }

        // Precondition 3: claim the Restarting transition exactly once.
        if self.status.get(&name) == ProviderStatus::Restarting {
            pgw_domain::info!("restart", "restart already in progress", name);
            return;
        }
        if !self
            .status
            .compare_and_swap(&name, ProviderStatus::Crashed, ProviderStatus::Restarting)
        {
            // Someone else won the race (or status moved on already).
            pgw_domain::info!("restart", "lost the race to claim restart", name);
            return;
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(config).await;
        });
    }

    async fn run(self: Arc<Self>, config: ProviderConfig) {
        let name = config.name.clone();

        // Step 4: bump the attempt counter, compute backoff.
        let attempt = self.status.increment_attempts(&name);
        let backoff = calculate_backoff(attempt);

        // Step 5: sleep, respecting shutdown.
        tokio::select! {
            () = self.shutdown.cancelled() => {
                self.status.set(&name, ProviderStatus::Crashed);
                self.cancel_residual_monitor(&name).await;
                pgw_domain::info!("restart", "shutdown observed during backoff sleep", name);
                return;
            }
            () = tokio::time::sleep(backoff) => {}
        }

        // Step 6: tear down the old session/process.
        let (old_session, old_process) = self.sessions.take(&name).await;
        if let Some(session) = old_session {
            session.close().await;
        }
        if let Some(process) = old_process {
            if process.is_alive().await {
                process.kill().await;
                process.wait().await;
            }
        }

        // Step 7: bounded reconnect.
        let reconnect = timeout(Tunables::RECONNECT_DEADLINE, self.lifecycle.connect(&config)).await;
        match reconnect {
            Ok(Ok(())) => {
                // Step 8: fresh health monitor.
                self.health.start(name.clone()).await;
                pgw_domain::info!("restart", "provider reconnected", name);
            }
            Ok(Err(e)) => {
                self.cancel_residual_monitor(&name).await;
                self.status.set(&name, ProviderStatus::Crashed);
                pgw_domain::warn!("restart", "reconnect failed", format!("{name}: {e}"));
            }
            Err(_) => {
                self.cancel_residual_monitor(&name).await;
                self.status.set(&name, ProviderStatus::Crashed);
                pgw_domain::warn!("restart", "reconnect deadline exceeded", name);
            }
        }
    }

    async fn cancel_residual_monitor(&self, name: &str) {
        if let Some(handle) = self.sessions.take_monitor(name).await {
            handle.cancel.cancel();
            let _ = handle.task.await;
        }
    }
}
