//! Status Registry (spec §4.1): `status[name]` and `attempts[name]`,
//! guarded by a single mutex, with atomic compare-and-swap on status.

use std::collections::HashMap;
use std::sync::Mutex;

use pgw_domain::ProviderStatus;

#[derive(Default)]
struct Inner {
    status: HashMap<String, ProviderStatus>,
    attempts: HashMap<String, u32>,
}

/// The sole serialization point between the Health Monitor and the
/// Restart Coordinator (spec §4.1, §9).
pub struct StatusRegistry {
    inner: Mutex<Inner>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegistry {
    /// Build an empty registry; every name defaults to `Unavailable`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Current status, defaulting to `Unavailable` for unknown names.
    #[must_use]
    pub fn get(&self, name: &str) -> ProviderStatus {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.status.get(name).copied().unwrap_or_default()
    }

    /// Unconditional write.
    pub fn set(&self, name: &str, status: ProviderStatus) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.status.insert(name.to_owned(), status);
    }

    /// Atomic compare-and-swap; returns whether the swap occurred.
    ///
    /// Unknown names are treated as `Unavailable` for the comparison,
    /// matching [`Self::get`]'s default.
    pub fn compare_and_swap(
        &self,
        name: &str,
        expected: ProviderStatus,
        new: ProviderStatus,
    ) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let current = inner.status.get(name).copied().unwrap_or_default();
        if current == expected {
            inner.status.insert(name.to_owned(), new);
            true
        } else {
            false
        }
    }

    /// Current restart-attempt count, defaulting to zero.
    #[must_use]
    pub fn get_attempts(&self, name: &str) -> u32 {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.attempts.get(name).copied().unwrap_or(0)
    }

    /// Increment the attempt counter, returning the post-increment value.
    pub fn increment_attempts(&self, name: &str) -> u32 {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = inner.attempts.entry(name.to_owned()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Reset the attempt counter to zero.
    pub fn reset_attempts(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.attempts.insert(name.to_owned(), 0);
    }

    /// Snapshot of every known status, for the health endpoint.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, ProviderStatus> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.status.clone()
    }
}
