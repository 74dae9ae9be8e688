//! Configuration Loader
//!
//! Handles loading configuration from asserting.toml and applying environment overrides.

use crate::suite::SuiteConfig;
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Directory names treated as assertion machinery when none are configured
pub const DEFAULT_INTERNAL_DIRS: &[&str] = &["assert", "mock", "require"];

/// Harness test files kept even inside an internal directory
pub const DEFAULT_HARNESS_FILES: &[&str] = &["mock_test.rs"];

/// Default HTTP client timeout
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration loader
///
/// Loads configuration and merges it with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Suite config (asserting.toml) - overrides defaults
/// 3. Environment variables (ASSERTING_*) - overrides suite config
#[derive(Debug, Default)]
pub struct ConfigLoader;

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Suite configuration
    pub suite: SuiteConfig,

    /// Directory where asserting.toml was found
    pub suite_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self
    }

    /// Load configuration for the crate under test
    ///
    /// Starts from `CARGO_MANIFEST_DIR` when cargo provides it, the current
    /// directory otherwise.
    pub fn load_for_crate(&self) -> ConfigResult<Config> {
        let start = match env::var_os("CARGO_MANIFEST_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir()?,
        };
        self.load_from_directory(&start)
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find asserting.toml; a missing file is
    /// not an error.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (suite_root, suite_config) = self.find_suite_config(start_dir)?;
        let suite_config = self.apply_env_overrides(suite_config)?;

        Ok(Config {
            suite: suite_config,
            suite_root,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let suite_config = SuiteConfig::load_from_file(config_path)?;
        let suite_config = self.apply_env_overrides(suite_config)?;

        Ok(Config {
            suite: suite_config,
            suite_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find suite configuration by walking up directory tree
    fn find_suite_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, SuiteConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let suite_config = SuiteConfig::load_from_file(&config_path)?;
                return Ok((Some(current), suite_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, SuiteConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides to suite config
    ///
    /// Recognised: ASSERTING_VERBOSE, ASSERTING_NO_COLOR, ASSERTING_HTTP_TIMEOUT,
    /// ASSERTING_FILTER
    fn apply_env_overrides(&self, mut config: SuiteConfig) -> ConfigResult<SuiteConfig> {
        if let Ok(verbose) = env::var("ASSERTING_VERBOSE") {
            config.report.get_or_insert_with(Default::default).verbose = Some(parse_flag(&verbose));
        }

        if let Ok(no_color) = env::var("ASSERTING_NO_COLOR") {
            config.report.get_or_insert_with(Default::default).color = Some(!parse_flag(&no_color));
        }

        if let Ok(timeout) = env::var("ASSERTING_HTTP_TIMEOUT") {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "ASSERTING_HTTP_TIMEOUT".to_string(),
                    reason: format!("'{}' is not a number of seconds: {}", timeout, e),
                })?;
            config.http.get_or_insert_with(Default::default).timeout_secs = Some(secs);
        }

        if let Ok(filter) = env::var("ASSERTING_FILTER") {
            if !filter.is_empty() {
                config.run.get_or_insert_with(Default::default).filter = Some(filter);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Directory names skipped during failure-site attribution
    pub fn internal_dirs(&self) -> Vec<String> {
        self.suite
            .attribution
            .as_ref()
            .and_then(|a| a.internal_dirs.clone())
            .unwrap_or_else(|| DEFAULT_INTERNAL_DIRS.iter().map(|d| d.to_string()).collect())
    }

    /// File names kept during attribution even inside internal directories
    pub fn harness_files(&self) -> Vec<String> {
        self.suite
            .attribution
            .as_ref()
            .and_then(|a| a.harness_files.clone())
            .unwrap_or_else(|| DEFAULT_HARNESS_FILES.iter().map(|f| f.to_string()).collect())
    }

    /// Whether the report prints one line per test
    pub fn verbose(&self) -> bool {
        self.suite
            .report
            .as_ref()
            .and_then(|r| r.verbose)
            .unwrap_or(false)
    }

    /// Whether the report is colorized
    pub fn color(&self) -> bool {
        self.suite
            .report
            .as_ref()
            .and_then(|r| r.color)
            .unwrap_or(true)
    }

    /// HTTP client timeout in seconds
    pub fn http_timeout_secs(&self) -> u64 {
        self.suite
            .http
            .as_ref()
            .and_then(|h| h.timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
    }

    /// Test name filter, if any
    pub fn filter(&self) -> Option<&str> {
        self.suite.run.as_ref().and_then(|r| r.filter.as_deref())
    }

    /// Get the directory holding asserting.toml
    pub fn suite_root(&self) -> Option<&Path> {
        self.suite_root.as_deref()
    }

    /// Check if an asserting.toml was found
    pub fn has_suite_file(&self) -> bool {
        self.suite_root.is_some()
    }
}
