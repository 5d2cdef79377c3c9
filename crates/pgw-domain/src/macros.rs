//! Structured-logging helpers.
//!
//! These wrap `tracing` macros so every log line carries a `category` field
//! the JSON formatter can group on, instead of free-form interpolated text.
//! Prefer these over calling `tracing::info!` etc. directly from
//! `pgw-supervisor` and `pgw-server`.

/// Log an informational event with a category tag and an optional detail.
#[macro_export]
macro_rules! info {
    ($category:expr, $message:expr) => {
        tracing::info!(category = $category, $message)
    };
    ($category:expr, $message:expr, $detail:expr) => {
        tracing::info!(category = $category, detail = %$detail, $message)
    };
}

/// Log a warning event with a category tag and an optional detail.
#[macro_export]
macro_rules! warn {
    ($category:expr, $message:expr) => {
        tracing::warn!(category = $category, $message)
    };
    ($category:expr, $message:expr, $detail:expr) => {
        tracing::warn!(category = $category, detail = %$detail, $message)
    };
}

/// Log an error event with a category tag and an optional detail.
#[macro_export]
macro_rules! error {
    ($category:expr, $message:expr) => {
        tracing::error!(category = $category, $message)
    };
    ($category:expr, $message:expr, $detail:expr) => {
        tracing::error!(category = $category, detail = %$detail, $message)
    };
}
