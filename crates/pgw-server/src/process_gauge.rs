//! Process-count gauge (spec §2 "ancillary slice", not part of the
//! Supervisor core).
//!
//! Derived from the Supervisor's own status snapshot rather than a
//! callback wired deep into the Session Lifecycle Manager: the core
//! stays completely ignorant of metrics exposition (spec §1's scope
//! boundary), and "how many providers are currently `Available`" is
//! already exactly what [`pgw_supervisor::ProviderSupervisor::snapshot_status`]
//! reports.

use std::collections::HashMap;

use pgw_domain::ProviderStatus;

/// Count of providers currently `Available`, published as a Prometheus
/// gauge (`pgw_providers_available`) every time the `health` endpoint is
/// hit.
pub fn record(snapshot: &HashMap<String, ProviderStatus>) -> usize {
    let available = snapshot
        .values()
        .filter(|status| status.is_available())
        .count();
    metrics::gauge!("pgw_providers_available").set(available as f64);
    metrics::gauge!("pgw_providers_total").set(snapshot.len() as f64);
    available
}
