//! Dispatch (spec §4.6): routes tool invocations to the correct
//! provider with correct status gating.

use std::sync::Arc;

use pgw_domain::{ProviderStatus, ToolDescriptor};
use serde_json::Value;
use tokio::time::timeout;

use crate::error::SupervisorError;
use crate::session_registry::SessionRegistry;
use crate::status_registry::StatusRegistry;
use crate::tool_index::ToolIndex;

/// Routes `call` and `listTools` against the live registries.
pub struct Dispatch {
    sessions: Arc<SessionRegistry>,
    status: Arc<StatusRegistry>,
    tools: Arc<ToolIndex>,
}

impl Dispatch {
    /// Build a dispatcher around the given collaborators.
    #[must_use]
    pub fn new(sessions: Arc<SessionRegistry>, status: Arc<StatusRegistry>, tools: Arc<ToolIndex>) -> Self {
        Self {
            sessions,
            status,
            tools,
        }
    }

    /// Invoke `toolName` on `providerName` (spec §4.6 steps 1-5).
    pub async fn call(
        &self,
        provider_name: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Value, SupervisorError> {
        // Step 1.
        let session = self
            .sessions
            .get_session(provider_name)
            .await
            .ok_or_else(|| SupervisorError::ProviderNotFound(provider_name.to_owned()))?;

        // Step 2.
        match self.status.get(provider_name) {
            ProviderStatus::Available => {}
            ProviderStatus::Crashed => {
                return Err(SupervisorError::ProviderCrashed(provider_name.to_owned()));
            }
            ProviderStatus::Unavailable | ProviderStatus::Restarting => {
                return Err(SupervisorError::ProviderNotRunning(provider_name.to_owned()));
            }
        }

        // Step 3.
        let descriptor = self
            .tools
            .get(provider_name, tool_name)
            .ok_or_else(|| SupervisorError::ToolNotFound {
                provider: provider_name.to_owned(),
                tool: tool_name.to_owned(),
            })?;

        // Step 4 + 5.
        match timeout(descriptor.timeout, session.call_tool(tool_name, arguments, descriptor.timeout)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(SupervisorError::ToolExecutionError {
                provider: provider_name.to_owned(),
                tool: tool_name.to_owned(),
                message: e.to_string(),
            }),
            Err(_) => Err(SupervisorError::TimeoutError {
                provider: provider_name.to_owned(),
                tool: tool_name.to_owned(),
            }),
        }
    }

    /// Independent copy of every currently indexed tool descriptor.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.snapshot()
    }
}
