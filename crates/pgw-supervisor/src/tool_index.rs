//! The tool catalogue index (spec §3 `ToolDescriptor`, §9 open question).
//!
//! Indexed by the `(providerName, toolName)` pair rather than a flat
//! `toolName`-only map, so that two providers exposing identically named
//! tools never shadow one another.

use dashmap::DashMap;
use pgw_domain::ToolDescriptor;

/// Concurrent map from `(providerName, toolName)` to its descriptor.
#[derive(Default)]
pub struct ToolIndex {
    entries: DashMap<(String, String), ToolDescriptor>,
}

impl ToolIndex {
    /// Build an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a descriptor.
    pub fn insert(&self, descriptor: ToolDescriptor) {
        self.entries.insert(descriptor.key(), descriptor);
    }

    /// Look up a descriptor by its identity pair.
    #[must_use]
    pub fn get(&self, provider_name: &str, tool_name: &str) -> Option<ToolDescriptor> {
        self.entries
            .get(&(provider_name.to_owned(), tool_name.to_owned()))
            .map(|entry| entry.value().clone())
    }

    /// Remove every descriptor belonging to `provider_name`. Used to
    /// unwind a partially populated catalogue on fetch failure.
    pub fn remove_provider(&self, provider_name: &str) {
        self.entries.retain(|key, _| key.0 != provider_name);
    }

    /// Independent copy of every descriptor currently indexed.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }
}
