//! Tool catalogue types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A single tool advertised by a provider's catalogue (spec §3).
///
/// `(provider_name, tool_name)` is the identity the tool index is keyed
/// by; two providers may advertise identically named tools without one
/// shadowing the other — see the open question in spec §9, resolved in
/// DESIGN.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Owning provider's name.
    pub provider_name: String,
    /// Tool name, as advertised by the provider.
    pub tool_name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON-Schema describing the tool's input.
    pub input_schema: Value,
    /// JSON-Schema describing the tool's output.
    pub output_schema: Value,
    /// Invocation timeout inherited from the owning provider's config.
    #[serde(skip)]
    pub timeout: Duration,
}

impl ToolDescriptor {
    /// Identity pair used for dispatch lookups.
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.provider_name.clone(), self.tool_name.clone())
    }
}
