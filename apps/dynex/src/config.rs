//! # Configuration
//!
//! Defaults for new snapshots and export passes, read from `dynex.toml`.
//!
//! ```toml
//! time_format = "double"   # integer | double | date | datetime
//! dynamic = true           # emit start/end bounds
//! indent = 2               # spaces per XML nesting level, 0 = single line
//! ```
//!
//! CLI flags override file values. A missing default file is not an error.

use dynex_core::{DynexError, TimeFormat};
use serde::Deserialize;
use std::path::Path;

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dynex.toml";

/// Maximum config file size (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynexConfig {
    pub time_format: TimeFormat,
    pub dynamic: bool,
    pub indent: usize,
}

impl Default for DynexConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::Double,
            dynamic: true,
            indent: 2,
        }
    }
}

impl DynexConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, DynexError> {
        toml::from_str(text).map_err(|e| DynexError::InvalidConfig(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `dynex.toml` in the working
    /// directory is used if present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, DynexError> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            DynexError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(DynexError::InvalidConfig(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            DynexError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

// =============================================================================
// TESTS
// =============================================================================
