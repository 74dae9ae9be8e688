//! Asserting - convention-driven test dispatch for `cargo test`
//!
//! This library provides:
//! - Discovery of `Test*`, `BeforeAll` and `BeforeEach` operations on a test case
//! - Dispatch of those operations in a fixed hook/test protocol
//! - Assertion predicates whose failures point at the caller's line
//! - HTTP and JSON helpers for web API test cases
//!
//! # Example
//!
//! ```
//! use asserting::{operations, Operation, Outcome, Suite, TestCase};
//!
//! #[derive(Default)]
//! struct Arithmetic {
//!     t: TestCase,
//!     runs: u32,
//! }
//!
//! impl Arithmetic {
//!     fn before_each(&mut self) -> Outcome {
//!         self.runs += 1;
//!         Ok(())
//!     }
//!
//!     fn test_addition(&mut self) -> Outcome {
//!         self.t.assert(2 == 1 * 4 / 2)?;
//!         self.t.assert(0 == -1 + 1)
//!     }
//!
//!     fn test_division(&mut self) -> Outcome {
//!         self.t.assert_false(4 == 10 / 3)
//!     }
//! }
//!
//! impl Suite for Arithmetic {
//!     fn operations() -> Vec<Operation<Self>> {
//!         operations![
//!             "BeforeEach" => Self::before_each,
//!             "TestAddition" => Self::test_addition,
//!             "TestDivision" => Self::test_division,
//!         ]
//!     }
//! }
//!
//! let mut case = Arithmetic::default();
//! let report = asserting::dispatch(&mut case).unwrap();
//! assert!(report.is_success());
//! assert_eq!(case.runs, 2);
//! ```

pub mod assert;
pub mod attribution;
pub mod convention;
pub mod dispatch;
pub mod failure;
pub mod http;
pub mod json;

// Re-export commonly used types
pub use assert::TestCase;
pub use attribution::{resolve_failure_site, AttributionRules, CallChain, Frame};
pub use convention::{is_entry_point, is_test_name, Role};
pub use dispatch::{Dispatcher, Operation, Plan, Report, Suite, TestReporter, TestResult, TestRun};
pub use failure::{DispatchError, Failure, Outcome};
pub use http::{Handler, HttpError, TestRequest, TestResponse, TestServer, WebTestCase};

use asserting_config::ConfigLoader;

/// Discover and run the operations of `case` with default settings
pub fn dispatch<T: Suite>(case: &mut T) -> Result<Report, DispatchError> {
    Dispatcher::new().dispatch(case)
}

/// Host entry point: dispatch `case`, print the report, fail the test on any failure
///
/// Settings come from the crate's asserting.toml and `ASSERTING_*` variables.
/// Call it from a `#[test]` function; a rejected test case, a failed hook or a
/// failed test panics with a summary of every failure.
#[track_caller]
pub fn run<T: Suite>(case: &mut T) -> Report {
    let config = match ConfigLoader::new().load_for_crate() {
        Ok(config) => config,
        Err(e) => panic!("asserting: invalid configuration: {}", e),
    };

    let report = match Dispatcher::from_config(&config).dispatch(case) {
        Ok(report) => report,
        Err(e) => panic!("asserting: {}", e),
    };

    TestReporter::from_config(&config).report(&report);

    if !report.is_success() {
        panic!("{}", report.failure_summary());
    }
    report
}
