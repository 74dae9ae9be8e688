//! Assertion predicates
//!
//! Every predicate returns an [`Outcome`]; use `?` to stop the test operation
//! at the first unmet expectation. Failure messages end with the `file:line`
//! of the calling test code when it can be resolved.
//!
//! # API
//!
//! ## Basic
//! - `assert(condition)` / `assert_false(condition)`
//! - `assertf(condition, message)`: assert with a custom message
//!
//! ## Equality
//! - `assert_equal(expected, actual)`: any `PartialEq + Debug`
//! - `assert_equal_int(expected, actual)`, `assert_equal_str(expected, actual)`
//!
//! ## Option / Result
//! - `assert_none(option)` / `assert_some(option)`
//! - `assert_error(result)`: assert `Result` is `Err`
//!
//! ## HTTP status codes
//! - `assert_ok(code)`: 200
//! - `assert_created(code)`: 201
//! - `assert_status(expected, actual)`

use crate::attribution::{AttributionRules, CallChain};
use crate::failure::{Failure, Outcome};
use asserting_config::Config;
use std::fmt::Debug;

/// HTTP 200
pub const STATUS_OK: u16 = 200;

/// HTTP 201
pub const STATUS_CREATED: u16 = 201;

/// Assertion methods, usually embedded as a field of a user test case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    rules: AttributionRules,
}

impl TestCase {
    /// Create a test case with the default attribution rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a test case with explicit attribution rules
    pub fn with_rules(rules: AttributionRules) -> Self {
        Self { rules }
    }

    /// Create a test case from asserting.toml settings
    pub fn from_config(config: &Config) -> Self {
        Self::with_rules(AttributionRules::from_config(config))
    }

    /// Attribution rules used for failure messages
    pub fn rules(&self) -> &AttributionRules {
        &self.rules
    }

    /// Build a failure attributed to the calling test code
    ///
    /// Custom predicates should be `#[track_caller]` and call this directly.
    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) -> Failure {
        let message = message.into();
        let location = CallChain::capture(&self.rules).resolve(&self.rules);
        tracing::debug!(%message, location = location.as_deref().unwrap_or(""), "assertion failed");
        Failure::at(message, location)
    }

    // ========================================================================
    // Basic assertions
    // ========================================================================

    /// Tests `v`'s truthiness
    #[track_caller]
    pub fn assert(&self, v: bool) -> Outcome {
        if !v {
            return Err(self.fail("Expected true, got false"));
        }
        Ok(())
    }

    /// Tests `v`'s falseness
    #[track_caller]
    pub fn assert_false(&self, v: bool) -> Outcome {
        if v {
            return Err(self.fail("Expected false, got true"));
        }
        Ok(())
    }

    /// Tests `ok`'s truthiness, shows `msg` on failure
    #[track_caller]
    pub fn assertf(&self, ok: bool, msg: &str) -> Outcome {
        if !ok {
            return Err(self.fail(format!("Assertion failed: {}", msg)));
        }
        Ok(())
    }

    // ========================================================================
    // Equality assertions
    // ========================================================================

    /// Tests that `actual` equals `expected`
    #[track_caller]
    pub fn assert_equal<T>(&self, expected: T, actual: T) -> Outcome
    where
        T: PartialEq + Debug,
    {
        if expected != actual {
            return Err(self.fail(format!("Expected {:?}, got {:?}", expected, actual)));
        }
        Ok(())
    }

    /// Tests equality for integer values
    #[track_caller]
    pub fn assert_equal_int(&self, expected: i64, actual: i64) -> Outcome {
        if expected != actual {
            return Err(self.fail(format!("Expected {} to equal {}", actual, expected)));
        }
        Ok(())
    }

    /// Tests equality for strings
    #[track_caller]
    pub fn assert_equal_str(&self, expected: &str, actual: &str) -> Outcome {
        if expected != actual {
            return Err(self.fail(format!("Expected {:?}, got {:?}", expected, actual)));
        }
        Ok(())
    }

    // ========================================================================
    // Option / Result assertions
    // ========================================================================

    /// Tests that `value` is `None`
    #[track_caller]
    pub fn assert_none<T: Debug>(&self, value: &Option<T>) -> Outcome {
        if let Some(inner) = value {
            return Err(self.fail(format!("Expected Some({:?}) to be None", inner)));
        }
        Ok(())
    }

    /// Tests that `value` is `Some`
    #[track_caller]
    pub fn assert_some<T>(&self, value: &Option<T>) -> Outcome {
        if value.is_none() {
            return Err(self.fail("Expected a value, got None"));
        }
        Ok(())
    }

    /// Tests that `result` is an error
    #[track_caller]
    pub fn assert_error<T: Debug, E>(&self, result: &Result<T, E>) -> Outcome {
        if let Ok(value) = result {
            return Err(self.fail(format!("Expected error, got Ok({:?})", value)));
        }
        Ok(())
    }

    // ========================================================================
    // HTTP status assertions
    // ========================================================================

    /// Tests for the HTTP OK code
    #[track_caller]
    pub fn assert_ok(&self, code: u16) -> Outcome {
        self.check_status(STATUS_OK, code)
    }

    /// Tests for the HTTP Created code
    #[track_caller]
    pub fn assert_created(&self, code: u16) -> Outcome {
        self.check_status(STATUS_CREATED, code)
    }

    /// Tests for a specific HTTP status code
    #[track_caller]
    pub fn assert_status(&self, expected: u16, actual: u16) -> Outcome {
        self.check_status(expected, actual)
    }

    #[track_caller]
    fn check_status(&self, expected: u16, actual: u16) -> Outcome {
        if expected != actual {
            return Err(self.fail(format!("Expected {}, got {}", expected, actual)));
        }
        Ok(())
    }
}
