//! Application configuration.
//!
//! Configuration is an ordinary value: the binary loads it once and hands
//! references to the parts that need it. Every field has a default, so a
//! partial (or missing) JSON file is fine.

use crate::cpu::MEMORY_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hack-emu.json";

/// Assembler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Directory for generated `.hack` files when no output path is given.
    pub output_dir: String,
    /// Write a `.hack` file when assembling.
    pub create_hack_file: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            output_dir: "output".into(),
            create_hack_file: true,
        }
    }
}

/// Debugger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Memory rows shown by the views.
    pub ram_view_size: usize,
    /// Step budget for a single run.
    pub max_steps: u64,
    /// Data memory size in cells.
    pub memory_size: usize,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            ram_view_size: 64,
            max_steps: 100_000,
            memory_size: MEMORY_SIZE,
        }
    }
}

/// Colors for the terminal view, as `RRGGBB` hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub color_current_instruction: String,
    pub color_breakpoint: String,
    pub color_modified_value: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            color_current_instruction: "FFFF00".into(),
            color_breakpoint: "FF6B6B".into(),
            color_modified_value: "90EE90".into(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assembler: AssemblerConfig,
    pub debugger: DebuggerConfig,
    pub view: ViewConfig,
}

impl Config {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&text)
    }

    /// Load configuration, falling back to defaults on any error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Parse configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut json = self.to_json()?;
        json.push('\n');
        std::fs::write(path.as_ref(), json).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid configuration: {0}")]
    Parse(String),
}
