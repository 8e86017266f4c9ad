//! Core functionality shared across the hiernet workspace.
//!
//! This crate provides configuration, logging initialization and the
//! error type used by the routing and simulation crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    Config, LoggingConfig, RoutingConfig, SimulationConfig, DEFAULT_HIERARCHY_HEIGHT,
    MIN_HIERARCHY_HEIGHT,
};
pub use error::{CoreError, CoreResult};
