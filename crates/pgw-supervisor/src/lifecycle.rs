//! Session Lifecycle Manager (spec §4.3): `connect` and `closeAll`.

use std::collections::HashMap;
use std::sync::Arc;

use pgw_domain::{ProviderConfig, ProviderStatus, ToolDescriptor};
use tokio::time::timeout;

use crate::error::SupervisorError;
use crate::session_registry::SessionRegistry;
use crate::status_registry::StatusRegistry;
use crate::tool_index::ToolIndex;
use crate::transport::ProviderTransport;

/// The fixed whitelist of system environment variables carried into every
/// provider's environment (spec §4.3 step 1).
const ENV_WHITELIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "LC_ALL", "TZ", "TMPDIR"];

/// Build a provider's child environment: whitelist entries from the
/// gateway's own environment, then the provider's configured `envs`
/// overriding on duplicate names.
#[must_use]
pub fn build_child_env(config: &ProviderConfig) -> Vec<(String, String)> {
    let mut env: HashMap<String, String> = HashMap::new();
    for key in ENV_WHITELIST {
        if let Ok(value) = std::env::var(key) {
            env.insert((*key).to_owned(), value);
        }
    }
    for (name, value) in &config.envs {
        env.insert(name.clone(), value.clone());
    }
    env.into_iter().collect()
}

/// Establishes and tears down provider sessions.
pub struct LifecycleManager {
    transport: Arc<dyn ProviderTransport>,
    sessions: Arc<SessionRegistry>,
    status: Arc<StatusRegistry>,
    tools: Arc<ToolIndex>,
}

impl LifecycleManager {
    /// Build a manager around the given collaborators.
    pub fn new(
        transport: Arc<dyn ProviderTransport>,
        sessions: Arc<SessionRegistry>,
        status: Arc<StatusRegistry>,
        tools: Arc<ToolIndex>,
    ) -> Self {
        Self {
            transport,
            sessions,
            status,
            tools,
        }
    }

    /// Establish a provider session end-to-end, with strict unwind-on-
    /// failure cleanup (spec §4.3 steps 1-9, §9 "cleanup symmetry").
    ///
    /// On success, also installs the disconnect watcher (step 9): a
    /// detached task that updates `Status(name)` once the session closes,
    /// without itself triggering a restart (spec §9 open question).
    pub async fn connect(&self, config: &ProviderConfig) -> Result<(), SupervisorError> {
        let env = build_child_env(config);
        let mut sanitized = config.clone();
        sanitized.envs = env;

        // Step 3: publish the process handle before the handshake.
        let process = self
            .transport
            .spawn(&sanitized)
            .await
            .map_err(|e| SupervisorError::ConnectFailed {
                name: config.name.clone(),
                message: e.to_string(),
            })?;
        self.sessions
            .publish_process(&config.name, Arc::clone(&process))
            .await;

        // Step 4: handshake.
        let session = match self.transport.handshake(&process, &sanitized).await {
            Ok(session) => session,
            Err(e) => {
                // Step 5: unwind.
                process.kill().await;
                self.sessions.remove_process(&config.name).await;
                pgw_domain::warn!(
                    "lifecycle",
                    "provider handshake failed",
                    format!("{}: {e}", config.name)
                );
                return Err(SupervisorError::ConnectFailed {
                    name: config.name.clone(),
                    message: e.to_string(),
                });
            }
        };

        // Step 6: publish session, mark Available.
        self.sessions
            .publish_session(&config.name, Arc::clone(&session))
            .await;
        self.status.set(&config.name, ProviderStatus::Available);

        // Step 7: fetch catalogue.
        match session.list_tools(config.timeout()).await {
            Ok(remote_tools) => {
                for tool in remote_tools {
                    self.tools.insert(ToolDescriptor {
                        provider_name: config.name.clone(),
                        tool_name: tool.name,
                        description: tool.description,
                        input_schema: tool.input_schema,
                        output_schema: tool.output_schema,
                        timeout: config.timeout(),
                    });
                }
                pgw_domain::info!("lifecycle", "provider connected", config.name.clone());
                self.spawn_disconnect_watcher(config.name.clone(), session);
                Ok(())
            }
            Err(e) => {
                // Step 8: unwind session + process + partial catalogue.
                self.tools.remove_provider(&config.name);
                session.close().await;
                process.kill().await;
                self.sessions.take(&config.name).await;
                self.status.set(&config.name, ProviderStatus::Unavailable);
                pgw_domain::warn!(
                    "lifecycle",
                    "provider catalogue fetch failed",
                    format!("{}: {e}", config.name)
                );
                Err(SupervisorError::CatalogueFailed {
                    name: config.name.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Spawn the step-9 disconnect watcher for a freshly connected
    /// session. Status-only: restart is the Health Monitor's decision.
    fn spawn_disconnect_watcher(&self, name: String, session: Arc<dyn crate::transport::Session>) {
        let status = Arc::clone(&self.status);
        tokio::spawn(async move {
            let closed_with_error = session.await_close().await;
            match closed_with_error {
                Some(reason) => {
                    status.set(&name, ProviderStatus::Crashed);
                    pgw_domain::warn!("lifecycle", "provider session closed with error", format!("{name}: {reason}"));
                }
                None => {
                    status.set(&name, ProviderStatus::Unavailable);
                    pgw_domain::info!("lifecycle", "provider session closed cleanly", name);
                }
            }
        });
    }

    /// Drive shutdown: close every session, then terminate (escalating to
    /// kill after a grace period) every child process (spec §4.3
    /// `closeAll`).
    pub async fn close_all(&self) {
        let entries = self.sessions.drain_all().await;

        let mut session_errors = Vec::new();
        for (name, session, _) in &entries {
            session.close().await;
            if let Some(reason) = session.await_close().await {
                session_errors.push(format!("{name}: {reason}"));
            }
        }

        let grace = pgw_domain::Tunables::SHUTDOWN_GRACE;
        let mut handles = Vec::with_capacity(entries.len());
        for (name, _, process) in entries {
            if let Some(process) = process {
                handles.push(tokio::spawn(async move {
                    process.terminate().await;
                    if timeout(grace, process.wait()).await.is_err() {
                        pgw_domain::warn!(
                            "lifecycle",
                            "process did not exit within shutdown grace period, killing",
                            name.clone()
                        );
                        process.kill().await;
                        process.wait().await;
                    }
                }));
            }
        }
        for handle in handles {
            let _ = handle.await;
        }

        if !session_errors.is_empty() {
            pgw_domain::warn!(
                "lifecycle",
                "shutdown observed session-close errors",
                session_errors.join("; ")
            );
        }
    }
}
