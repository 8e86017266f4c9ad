//! Configuration management for hiernet.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
#[cfg(feature = "toml")]
use std::path::Path;
#[cfg(feature = "toml")]
use tracing::debug;

/// Depth of the address tree when nothing else is configured.
///
/// Leaf addresses carry this many components (`"1.1.1"`), a level-0 cluster
/// one fewer (`"1.1"`), and so on up to the empty root domain.
pub const DEFAULT_HIERARCHY_HEIGHT: usize = 3;

/// Smallest tree that still has a cluster level between leaves and root.
pub const MIN_HIERARCHY_HEIGHT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub routing: RoutingConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Number of address components of a leaf node.
    pub hierarchy_height: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            hierarchy_height: DEFAULT_HIERARCHY_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable output
    pub json: bool,
    /// Fallback filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Routing passes to run from the root coordinator
    pub passes: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { passes: 1 }
    }
}

impl Config {
    /// Read, parse and validate a TOML file.
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Reject settings the routing core cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.routing.hierarchy_height < MIN_HIERARCHY_HEIGHT {
            return Err(CoreError::Config(format!(
                "hierarchy_height must be at least {}, got {}",
                MIN_HIERARCHY_HEIGHT, self.routing.hierarchy_height
            )));
        }
        if self.simulation.passes == 0 {
            return Err(CoreError::Config(
                "simulation.passes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
