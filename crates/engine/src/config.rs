//! Engine configuration
//!
//! All tunables live in one struct that can be built in code or read from a
//! TOML file. Missing fields take their defaults:
//!
//! ```toml
//! latch_stripes = 64
//! initial_cas = 0
//!
//! [limits]
//! max_in_node_value_size = 250
//! max_value_size = 1048576
//! block_size = 4096
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_concurrency::DEFAULT_LATCH_STRIPES;
use strata_core::error::{Error, Result};
use strata_core::value::ValueLimits;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Value size bounds
    pub limits: ValueLimits,
    /// Number of per-key latch stripes
    pub latch_stripes: usize,
    /// CAS identifiers start above this value
    pub initial_cas: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: ValueLimits::default(),
            latch_stripes: DEFAULT_LATCH_STRIPES,
            initial_cas: 0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        if self.latch_stripes == 0 {
            return Err(Error::Config("latch_stripes must be non-zero".to_string()));
        }
        Ok(())
    }
}
