//! Configuration types for archgraph.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for slice cycle violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the check.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Top-level configuration for archgraph, read from `archgraph.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Import behaviour.
    #[serde(default)]
    pub import: ImportConfig,

    /// Slice cycle rules, evaluated in order.
    #[serde(default)]
    pub slices: Vec<SliceRuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// Import behaviour configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Abort on the first malformed class file instead of skipping it.
    #[serde(default)]
    pub fail_fast: bool,
}

/// One slice cycle rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceRuleConfig {
    /// Capture-group pattern over fully qualified class names.
    pub pattern: String,

    /// Display-name template with `$1`-style placeholders.
    #[serde(default)]
    pub name: Option<String>,

    /// Maximum example dependencies retained per slice edge.
    #[serde(default = "default_evidence_limit")]
    pub evidence_limit: usize,

    /// Severity of cycles found by this rule.
    #[serde(default = "default_severity")]
    pub severity: Severity,
}

fn default_evidence_limit() -> usize {
    20
}

fn default_severity() -> Severity {
    Severity::Error
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
