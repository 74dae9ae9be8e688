//! Helpers that live in an `assert` directory
//!
//! They are deliberately not `#[track_caller]`: failures raised here are
//! attributed to this file first, and the resolver has to skip it.

use asserting::{Outcome, TestCase};

/// Fails unless `value` is even
pub fn check_even(t: &TestCase, value: i64) -> Outcome {
    t.assertf(value % 2 == 0, "value is odd")
}
