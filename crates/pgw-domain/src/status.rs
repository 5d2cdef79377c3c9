//! Provider lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single provider.
///
/// A name not yet observed by the Status Registry is implicitly
/// [`ProviderStatus::Unavailable`] — see spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Session is live and accepting tool calls.
    Available,
    /// No live session; either never connected or cleanly disconnected.
    Unavailable,
    /// The health monitor (or the disconnect watcher) observed a failure.
    Crashed,
    /// A restart is in flight for this provider.
    Restarting,
}

impl Default for ProviderStatus {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl ProviderStatus {
    /// Whether tool dispatch may proceed against a provider in this status.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Crashed => "crashed",
            Self::Restarting => "restarting",
        };
        f.write_str(s)
    }
}
