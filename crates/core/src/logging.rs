//! Structured logging infrastructure for hiernet.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use crate::config::LoggingConfig;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use hiernet_core::logging;
///
/// logging::init();
/// tracing::info!("Simulation started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize the logging system with JSON output.
///
/// Suitable for feeding routing traces into log aggregation tooling.
///
/// # Example
/// ```no_run
/// use hiernet_core::logging;
///
/// logging::init_json();
/// tracing::info!(cluster = "1.1", "Routing pass finished");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}

/// Initialize logging as described by a [`LoggingConfig`].
///
/// `RUST_LOG` still wins over the configured level.
pub fn init_from_config(config: &LoggingConfig) {
    let layer = fmt::layer().with_target(true).with_thread_ids(true);
    let registry = tracing_subscriber::registry().with(env_filter(&config.level));

    if config.json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }
    debug!(json = config.json, level = %config.level, "Logging initialized");
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}
