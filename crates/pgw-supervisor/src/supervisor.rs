//! The Provider Supervisor facade: wires the five components together
//! and is the only type `pgw-server` depends on directly.

use std::collections::HashMap;
use std::sync::Arc;

use pgw_domain::{ProviderConfig, ProviderStatus, ToolDescriptor, Tunables};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatch;
use crate::error::SupervisorError;
use crate::health::HealthMonitor;
use crate::lifecycle::LifecycleManager;
use crate::restart::RestartCoordinator;
use crate::session_registry::SessionRegistry;
use crate::status_registry::StatusRegistry;
use crate::tool_index::ToolIndex;
use crate::transport::ProviderTransport;

/// Owns every component of §2's table and exposes the HTTP-facing
/// operations (`connect`, `call`, `list_tools`, `snapshot_status`,
/// `shutdown`).
pub struct ProviderSupervisor {
    status: Arc<StatusRegistry>,
    lifecycle: Arc<LifecycleManager>,
    health: Arc<HealthMonitor>,
    dispatch: Dispatch,
    shutdown: CancellationToken,
    configs: Arc<std::sync::Mutex<HashMap<String, ProviderConfig>>>,
}

impl ProviderSupervisor {
    /// Build a supervisor around a concrete protocol transport and
    /// fleet-wide tunables. Does not spawn anything; call
    /// [`Self::connect_all`] to bring providers up.
    #[must_use]
    pub fn new(transport: Arc<dyn ProviderTransport>, tunables: Tunables) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let status = Arc::new(StatusRegistry::new());
        let tools = Arc::new(ToolIndex::new());
        let shutdown = CancellationToken::new();

        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&transport),
            Arc::clone(&sessions),
            Arc::clone(&status),
            Arc::clone(&tools),
        ));
        let health = Arc::new(HealthMonitor::new(
            Arc::clone(&sessions),
            Arc::clone(&status),
            tunables,
        ));
        let restart = Arc::new(RestartCoordinator::new(
            Arc::clone(&sessions),
            Arc::clone(&status),
            Arc::clone(&lifecycle),
            Arc::clone(&health),
            tunables.restart_policy,
            shutdown.clone(),
        ));

        let restart_for_callback = Arc::clone(&restart);
        let configs: Arc<std::sync::Mutex<HashMap<String, ProviderConfig>>> =
            Arc::new(std::sync::Mutex::new(HashMap::new()));
        let configs_for_callback = Arc::clone(&configs);
        health.set_crash_callback(Arc::new(move |name: String| {
            let configs = Arc::clone(&configs_for_callback);
            let restart = Arc::clone(&restart_for_callback);
            let config = configs
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(&name)
                .cloned();
            if let Some(config) = config {
                restart.restart(config);
            }
        }));

        let dispatch = Dispatch::new(Arc::clone(&sessions), Arc::clone(&status), Arc::clone(&tools));

        Self {
            status,
            lifecycle,
            health,
            dispatch,
            shutdown,
            configs,
        }
    }

    /// Connect every configured provider and start its health monitor.
    /// Per-provider failures are logged and leave that provider
    /// `Unavailable`/`Crashed` rather than aborting the whole fleet.
    pub async fn connect_all(&self, configs: Vec<ProviderConfig>) {
        for config in configs {
            {
                let mut remembered = self
                    .configs
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                remembered.insert(config.name.clone(), config.clone());
            }
            match self.lifecycle.connect(&config).await {
                Ok(()) => {
                    self.health.start(config.name.clone()).await;
                }
                Err(e) => {
                    pgw_domain::error!("supervisor", "provider failed to connect at startup", format!("{}: {e}", config.name));
                }
            }
        }
    }

    /// Invoke a tool (spec §4.6).
    pub async fn call(
        &self,
        provider_name: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Value, SupervisorError> {
        self.dispatch.call(provider_name, tool_name, arguments).await
    }

    /// Snapshot the current tool catalogue.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.dispatch.list_tools()
    }

    /// Snapshot every provider's current status, for the health
    /// endpoint (spec §6.1 `health`).
    #[must_use]
    pub fn snapshot_status(&self) -> HashMap<String, ProviderStatus> {
        self.status.snapshot()
    }

    /// Tear everything down (spec §4.3 `closeAll`). Cancels the shared
    /// shutdown token first so any in-flight restart backs off cleanly.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.lifecycle.close_all().await;
    }
}
