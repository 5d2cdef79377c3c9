//! `tracing-subscriber` initialization (spec §1 "logging sinks" — out
//! of the Supervisor's core, concrete here).
//!
//! All crates log through the `pgw_domain::{info,warn,error}` macros,
//! which tag every event with a `category` field; this installs the
//! `EnvFilter`-driven subscriber those events flow into, picking a
//! compact or JSON formatter by `LOG_FORMAT`.

/// Initialize the global `tracing` subscriber from `RUST_LOG`
/// (default `info`) and `LOG_FORMAT` (`json` | `pretty`, default
/// `pretty`).
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json_format {
        subscriber.json().init();
    } else {
        subscriber.compact().init();
    }
}
