//! Asserting Configuration System
//!
//! Provides configuration for the asserting test engine:
//! - Suite configuration (asserting.toml)
//! - Environment variable overrides (ASSERTING_*)
//! - Effective settings with built-in defaults
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Suite config (./asserting.toml, searched upwards)
//! 3. Environment variables (ASSERTING_*)
//!
//! # Example
//!
//! ```no_run
//! use asserting_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! assert!(config.http_timeout_secs() > 0);
//! ```

pub mod loader;
pub mod suite;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Name of the per-suite configuration file
pub const CONFIG_FILE_NAME: &str = "asserting.toml";

// Re-export main types
pub use loader::{Config, ConfigLoader};
pub use suite::{AttributionConfig, HttpConfig, ReportConfig, RunConfig, SuiteConfig};
