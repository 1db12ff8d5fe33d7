//! Library entry for spacelink-cli used by integration tests and embedding.

pub mod commands;

// Re-export commands for convenience
pub use commands::*;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spacelink_core::{LinkConfig, StackConfig};
use std::fs;

/// Link framing to encode or decode
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LinkKind {
    /// Sync marker, header and raw payload
    #[default]
    Ms200,
    /// Trace, header, structured message and CRC16
    Ewc,
}

/// Contents of a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Pool and queue sizing
    pub stack: StackConfig,
    /// Interface settings
    pub link: LinkConfig,
}

/// Read a JSON config file, or fall back to defaults when no path is given
pub fn load_config(path: Option<&str>) -> Result<CliConfig> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path))
}
