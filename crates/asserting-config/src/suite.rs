//! Suite Configuration (asserting.toml)
//!
//! Handles suite-level configuration stored in `asserting.toml`, usually next to
//! the crate's `Cargo.toml`.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Suite configuration from asserting.toml
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Failure-site attribution settings
    pub attribution: Option<AttributionConfig>,

    /// Report output settings
    pub report: Option<ReportConfig>,

    /// HTTP helper settings
    pub http: Option<HttpConfig>,

    /// Dispatch settings
    pub run: Option<RunConfig>,
}

/// Failure-site attribution settings
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct AttributionConfig {
    /// Directory names whose frames are skipped (default: assert, mock, require)
    pub internal_dirs: Option<Vec<String>>,

    /// File names kept even when they live in an internal directory
    pub harness_files: Option<Vec<String>>,
}

/// Report output settings
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// One line per test instead of progress dots
    pub verbose: Option<bool>,

    /// Colorize the report
    pub color: Option<bool>,
}

/// HTTP helper settings
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Client timeout in seconds (default: 30)
    pub timeout_secs: Option<u64>,
}

/// Dispatch settings
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Only run test operations whose name contains this pattern
    pub filter: Option<String>,
}

impl SuiteConfig {
    /// Load suite configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the suite configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(attribution) = &self.attribution {
            if let Some(dirs) = &attribution.internal_dirs {
                for dir in dirs {
                    validate_path_segment("attribution.internal_dirs", dir)?;
                }
            }
            if let Some(files) = &attribution.harness_files {
                for file in files {
                    validate_path_segment("attribution.harness_files", file)?;
                }
            }
        }

        if let Some(http) = &self.http {
            if http.timeout_secs == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "http.timeout_secs".to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if let Some(run) = &self.run {
            if run.filter.as_deref() == Some("") {
                return Err(ConfigError::InvalidValue {
                    field: "run.filter".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// A single directory or file name: no separators, not empty
fn validate_path_segment(field: &str, value: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "entries must not be empty".to_string(),
        });
    }
    if value.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' must be a single name, not a path", value),
        });
    }
    Ok(())
}
