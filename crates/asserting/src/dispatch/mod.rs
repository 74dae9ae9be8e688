//! Dispatch infrastructure
//!
//! Discovers a test case's operations by naming convention, runs them in the
//! fixed hook/test protocol, and reports the results.

pub mod registry;
pub mod reporter;
pub mod runner;

pub use registry::{Operation, OperationFn, Plan, Suite};
pub use reporter::TestReporter;
pub use runner::{Dispatcher, Report, TestResult, TestRun};
