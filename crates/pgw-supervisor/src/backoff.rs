//! Bounded exponential back-off for the Restart Coordinator (spec §4.5
//! step 4, §8).

use std::time::Duration;

/// `min(2^(attempt-1) seconds, 4 seconds)`: attempt 1 -> 1s, 2 -> 2s,
/// 3+ -> 4s. `attempt` is expected to be `>= 1`; `0` is treated as `1`.
#[must_use]
pub fn calculate_backoff(attempt: u32) -> Duration {
    let attempt = attempt.max(1);
    let exp = attempt.saturating_sub(1).min(2);
    let secs = 1u64 << exp;
    Duration::from_secs(secs.min(4))
}
