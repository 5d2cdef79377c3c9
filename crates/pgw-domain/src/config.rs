//! Declarative provider configuration (spec §6.2) and fleet-wide tunables
//! (spec §6.3).
//!
//! Parsing the YAML document itself lives in `pgw-server` (ambient
//! concern); this module owns the validated, immutable shape the
//! Supervisor is handed once at startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Name pattern: `^[A-Za-z0-9_-]+$`, length 1..=50.
fn is_valid_name(name: &str) -> bool {
    (1..=50).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Env var name pattern: `^[A-Z0-9_]+$`.
fn is_valid_env_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// One `(name, value)` pair to inject into a provider's environment.
///
/// `value` is already expanded (caller-side interpolation, if any, has
/// already happened) by the time this reaches the Session Lifecycle
/// Manager — see spec §4.3 step 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Environment variable name.
    pub name: String,
    /// Environment variable value.
    pub value: String,
}

/// Raw, on-disk shape of one provider entry (spec §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProviderConfig {
    /// Unique provider identifier.
    pub name: String,
    /// Executable path, absolute or `PATH`-resolvable.
    pub command: String,
    /// Arguments passed to the executable, in order.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables to set for this provider.
    #[serde(default)]
    pub envs: Vec<EnvVar>,
    /// Tool invocation timeout in milliseconds. Defaults applied at validation time.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Validated, immutable provider description (spec §3 `ProviderConfig`).
///
/// Lifetime: loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Unique provider identifier, matching `^[A-Za-z0-9_-]+$`.
    pub name: String,
    /// Path to the provider's executable.
    pub executable: String,
    /// Ordered argument list.
    pub args: Vec<String>,
    /// Ordered `(name, value)` environment pairs, values already expanded.
    pub envs: Vec<(String, String)>,
    /// Positive timeout for tool invocations against this provider.
    pub timeout_ms: u64,
}

impl ProviderConfig {
    /// Validate and convert a raw, on-disk provider entry.
    ///
    /// `default_timeout_ms` and `max_timeout_ms` come from the fleet-wide
    /// tunables (spec §6.3); `timeout: null` in YAML falls back to the
    /// default, and any value exceeding the max is rejected rather than
    /// silently clamped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the name, command, env names, or
    /// timeout bound fail validation.
    pub fn from_raw(
        raw: RawProviderConfig,
        default_timeout_ms: u64,
        max_timeout_ms: u64,
    ) -> Result<Self> {
        if !is_valid_name(&raw.name) {
            return Err(Error::ConfigInvalid {
                key: "providers[].name".to_owned(),
                message: format!(
                    "'{}' must match ^[A-Za-z0-9_-]+$ and be 1..=50 characters",
                    raw.name
                ),
            });
        }
        if raw.command.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                key: format!("providers[{}].command", raw.name),
                message: "command must not be empty".to_owned(),
            });
        }

        let mut envs = Vec::with_capacity(raw.envs.len());
        for env in raw.envs {
            if !is_valid_env_name(&env.name) {
                return Err(Error::ConfigInvalid {
                    key: format!("providers[{}].envs", raw.name),
                    message: format!("env name '{}' must match ^[A-Z0-9_]+$", env.name),
                });
            }
            envs.push((env.name, env.value));
        }

        let timeout_ms = raw.timeout.unwrap_or(default_timeout_ms);
        if timeout_ms == 0 || timeout_ms > max_timeout_ms {
            return Err(Error::ConfigInvalid {
                key: format!("providers[{}].timeout", raw.name),
                message: format!(
                    "timeout must be in 1..={max_timeout_ms}ms, got {timeout_ms}ms"
                ),
            });
        }

        Ok(Self {
            name: raw.name,
            executable: raw.command,
            args: raw.args,
            envs,
            timeout_ms,
        })
    }

    /// Tool-call deadline derived from [`Self::timeout_ms`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Restart policy selecting whether the Restart Coordinator ever reconnects
/// a crashed provider (spec §4.5 step 1, §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Crashed providers are left `Crashed`; no reconnect is ever attempted.
    Never,
    /// Crashed providers are reconnected, bounded by `MAX_RESTART_ATTEMPTS`.
    OnFailure,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::Never
    }
}

/// Fleet-wide tunables (spec §6.3), resolved from the environment once at
/// startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    /// Per-provider ping period.
    pub health_check_interval_ms: u64,
    /// Whether crashed providers are ever reconnected.
    pub restart_policy: RestartPolicy,
    /// Fallback timeout for providers that omit `timeout`.
    pub default_timeout_ms: u64,
    /// Upper bound on any provider's configured timeout.
    pub max_timeout_ms: u64,
}

impl Tunables {
    /// Maximum number of restart attempts before a provider is left
    /// permanently `Crashed` (spec invariant I5).
    pub const MAX_RESTART_ATTEMPTS: u32 = 3;
    /// Three-strike failure threshold for the Health Monitor (spec §4.4).
    pub const FAILURE_THRESHOLD: u32 = 3;
    /// Grace period `closeAll` waits before force-killing a child process.
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
    /// Deadline bound on a single reconnect attempt (spec §4.5 step 7).
    pub const RECONNECT_DEADLINE: Duration = Duration::from_secs(30);

    /// Per-ping deadline: `clamp(intervalMs / 2, 3s, 10s)` (spec §4.4 step 3).
    #[must_use]
    pub fn ping_deadline(self) -> Duration {
        let half = Duration::from_millis(self.health_check_interval_ms / 2);
        half.clamp(Duration::from_secs(3), Duration::from_secs(10))
    }

    /// Health-check tick interval.
    #[must_use]
    pub fn health_check_interval(self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            health_check_interval_ms: 30_000,
            restart_policy: RestartPolicy::Never,
            default_timeout_ms: 30_000,
            max_timeout_ms: 300_000,
        }
    }
}
