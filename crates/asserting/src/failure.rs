//! Failure and error types

use crate::convention::Role;
use thiserror::Error;

/// Result of a test operation or hook. `Err` ends the operation early.
pub type Outcome = Result<(), Failure>;

/// An unmet expectation, optionally attributed to a `file:line` in test code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", location_suffix(.location))]
pub struct Failure {
    /// Human readable description with expected/actual values
    pub message: String,
    /// Attribution token, `None` when no user frame was found
    pub location: Option<String>,
}

fn location_suffix(location: &Option<String>) -> String {
    match location {
        Some(token) if !token.is_empty() => format!(" [{}]", token),
        _ => String::new(),
    }
}

impl Failure {
    /// Create a failure without a location
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Create a failure with an optional attribution token
    pub fn at(message: impl Into<String>, location: Option<String>) -> Self {
        Self {
            message: message.into(),
            location: location.filter(|token| !token.is_empty()),
        }
    }

    /// Prefix the message, keeping the location
    pub fn context(self, prefix: &str) -> Self {
        Self {
            message: format!("{}: {}", prefix, self.message),
            location: self.location,
        }
    }
}

/// Errors raised while building a dispatch plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Duplicate {role} hooks: '{first}' and '{second}'")]
    DuplicateHook {
        role: Role,
        first: String,
        second: String,
    },

    #[error("Operation '{name}' is registered more than once")]
    DuplicateName { name: String },
}
