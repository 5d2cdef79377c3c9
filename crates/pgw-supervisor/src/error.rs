//! Caller-facing error taxonomy (spec §7).
//!
//! Distinct from [`pgw_domain::Error`], which covers internal/config
//! failures below the Supervisor's public surface. `SupervisorError` is
//! what the HTTP layer (out of scope here) maps to status codes.

use thiserror::Error;

/// Errors returned by [`crate::supervisor::ProviderSupervisor::call`],
/// [`crate::supervisor::ProviderSupervisor::connect`], and friends.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// No session registered for the given provider name. Maps to 404.
    #[error("provider '{0}' not found")]
    ProviderNotFound(String),

    /// Provider exists but the tool is not in its catalogue. Maps to 404.
    #[error("tool '{tool}' not found on provider '{provider}'")]
    ToolNotFound {
        /// Provider the lookup was attempted against.
        provider: String,
        /// Tool name that was not found.
        tool: String,
    },

    /// Status is not `Available` at dispatch time. Maps to 503.
    #[error("provider '{0}' is not running")]
    ProviderNotRunning(String),

    /// Provider observed as `Crashed`. Maps to 502.
    #[error("provider '{0}' has crashed")]
    ProviderCrashed(String),

    /// Tool call exceeded the provider's configured timeout. Maps to 408.
    #[error("call to '{provider}/{tool}' timed out")]
    TimeoutError {
        /// Provider the call targeted.
        provider: String,
        /// Tool the call targeted.
        tool: String,
    },

    /// Provider returned a protocol-level error. Maps to 500.
    #[error("tool execution failed on '{provider}/{tool}': {message}")]
    ToolExecutionError {
        /// Provider the call targeted.
        provider: String,
        /// Tool the call targeted.
        tool: String,
        /// Underlying transport-reported message.
        message: String,
    },

    /// Startup-time handshake failure; aborts initialization of that
    /// provider.
    #[error("failed to connect provider '{name}': {message}")]
    ConnectFailed {
        /// Provider that failed to connect.
        name: String,
        /// Underlying transport-reported message.
        message: String,
    },

    /// Startup-time catalogue fetch failure; aborts initialization of
    /// that provider.
    #[error("failed to fetch tool catalogue for provider '{name}': {message}")]
    CatalogueFailed {
        /// Provider whose catalogue fetch failed.
        name: String,
        /// Underlying transport-reported message.
        message: String,
    },

    /// Any unclassified failure.
    #[error("internal supervisor error: {0}")]
    InternalError(String),
}

impl SupervisorError {
    /// The §7 taxonomy kind, for logging and metrics tagging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "ProviderNotFound",
            Self::ToolNotFound { .. } => "ToolNotFound",
            Self::ProviderNotRunning(_) => "ProviderNotRunning",
            Self::ProviderCrashed(_) => "ProviderCrashed",
            Self::TimeoutError { .. } => "TimeoutError",
            Self::ToolExecutionError { .. } => "ToolExecutionError",
            Self::ConnectFailed { .. } => "ConnectFailed",
            Self::CatalogueFailed { .. } => "CatalogueFailed",
            Self::InternalError(_) => "InternalError",
        }
    }
}
