//! Structured logging setup.
//!
//! Uses `tracing` with `tracing-subscriber`: environment-based filtering via
//! `RUST_LOG` (falling back to the configured level) and a pretty, compact
//! or JSON formatter chosen by the settings.

use crate::config::Settings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the global subscriber. Safe to call once per process; a
/// second call is ignored (the first subscriber stays installed).
pub fn init(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));

    let layer = match settings.log_format.as_str() {
        "json" => fmt::layer().json().boxed(),
        "pretty" => fmt::layer().pretty().boxed(),
        _ => fmt::layer().compact().boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
