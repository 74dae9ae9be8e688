//! Dispatcher - run a plan's hooks and tests against a test case

use crate::attribution::enter_operation;
use crate::dispatch::registry::{Operation, Plan, Suite};
use crate::failure::{DispatchError, Failure, Outcome};
use asserting_config::Config;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Result of running a single test operation
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    /// Test passed successfully
    Pass { duration: Duration },
    /// Test (or its per-test hook) returned a failure
    Fail { failure: Failure, duration: Duration },
    /// Test (or its per-test hook) panicked
    Panicked { message: String, duration: Duration },
    /// Test was not run because the setup-once hook failed
    Skipped,
}

impl TestResult {
    /// Check if this result is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    /// Check if this result is a failure
    pub fn is_fail(&self) -> bool {
        matches!(
            self,
            TestResult::Fail { .. } | TestResult::Panicked { .. } | TestResult::Skipped
        )
    }

    /// Get the duration of this test
    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Pass { duration } => *duration,
            TestResult::Fail { duration, .. } => *duration,
            TestResult::Panicked { duration, .. } => *duration,
            TestResult::Skipped => Duration::ZERO,
        }
    }

    /// One-line description of why the test did not pass
    pub fn reason(&self) -> Option<String> {
        match self {
            TestResult::Pass { .. } => None,
            TestResult::Fail { failure, .. } => Some(failure.to_string()),
            TestResult::Panicked { message, .. } => Some(format!("panicked: {}", message)),
            TestResult::Skipped => Some("not run: BeforeAll failed".to_string()),
        }
    }
}

/// A completed test run
#[derive(Debug, Clone, PartialEq)]
pub struct TestRun {
    /// Name of the test operation
    pub name: String,
    /// `file:line` where the operation was registered
    pub site: String,
    /// Result of running the test
    pub result: TestResult,
}

/// Outcome of dispatching one test case
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Test runs in dispatch order
    pub runs: Vec<TestRun>,
    /// Failure of the setup-once hook, if it failed
    pub setup_failure: Option<Failure>,
}

impl Report {
    /// Number of passed tests
    pub fn passed(&self) -> usize {
        self.runs.iter().filter(|r| r.result.is_pass()).count()
    }

    /// Number of tests that did not pass
    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|r| r.result.is_fail()).count()
    }

    /// True when setup succeeded and every test passed
    pub fn is_success(&self) -> bool {
        self.setup_failure.is_none() && self.failed() == 0
    }

    /// Find the run for a test by name
    pub fn run(&self, name: &str) -> Option<&TestRun> {
        self.runs.iter().find(|r| r.name == name)
    }

    /// Multi-line summary of every failure, for the host fail primitive
    pub fn failure_summary(&self) -> String {
        let mut lines = Vec::new();
        if let Some(failure) = &self.setup_failure {
            lines.push(format!("BeforeAll failed: {}", failure));
        }
        lines.push(format!(
            "{} of {} test operations failed",
            self.failed(),
            self.runs.len()
        ));
        for run in &self.runs {
            if let Some(reason) = run.result.reason() {
                lines.push(format!("  {}: {}", run.name, reason));
            }
        }
        lines.join("\n")
    }
}

/// Dispatcher with configuration
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    /// Only tests whose name contains this pattern run
    filter: Option<String>,
}

impl Dispatcher {
    /// Create a new dispatcher with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher from the `[run]` section of asserting.toml
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: config.filter().map(str::to_string),
        }
    }

    /// Only run tests whose name contains `pattern`
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    /// Discover the operations of `case` and run them
    pub fn dispatch<T: Suite>(&self, case: &mut T) -> Result<Report, DispatchError> {
        let plan = match Plan::<T>::discover() {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "rejected test case");
                return Err(e);
            }
        };
        let plan = match &self.filter {
            Some(pattern) => plan.filter(pattern),
            None => plan,
        };
        Ok(self.execute(&plan, case))
    }

    /// Run a classified plan against `case`
    ///
    /// The setup-once hook runs first. Each test is preceded by the per-test
    /// hook; a failing test never stops its siblings.
    pub fn execute<T>(&self, plan: &Plan<T>, case: &mut T) -> Report {
        let mut report = Report::default();

        if let Some(hook) = &plan.setup_once {
            tracing::debug!(hook = hook.name(), "running setup-once hook");
            let failure = match invoke(hook, case) {
                Ok(Ok(())) => None,
                Ok(Err(failure)) => Some(failure),
                Err(message) => Some(Failure::new(format!("panicked: {}", message))),
            };
            if let Some(failure) = failure {
                tracing::warn!(hook = hook.name(), %failure, "setup-once hook failed, skipping tests");
                report.runs = plan
                    .tests
                    .iter()
                    .map(|test| TestRun {
                        name: test.name().to_string(),
                        site: site_token(test),
                        result: TestResult::Skipped,
                    })
                    .collect();
                report.setup_failure = Some(failure);
                return report;
            }
        }

        tracing::debug!(tests = plan.len(), "running tests");
        for test in &plan.tests {
            let result = self.run_single_test(plan.setup_each.as_ref(), test, case);
            report.runs.push(TestRun {
                name: test.name().to_string(),
                site: site_token(test),
                result,
            });
        }

        report
    }

    /// Run a single test, preceded by the per-test hook
    fn run_single_test<T>(
        &self,
        setup_each: Option<&Operation<T>>,
        test: &Operation<T>,
        case: &mut T,
    ) -> TestResult {
        let start = Instant::now();

        if let Some(hook) = setup_each {
            match invoke(hook, case) {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => {
                    return TestResult::Fail {
                        failure: failure.context(hook.name()),
                        duration: start.elapsed(),
                    };
                }
                Err(message) => {
                    return TestResult::Panicked {
                        message: format!("{}: {}", hook.name(), message),
                        duration: start.elapsed(),
                    };
                }
            }
        }

        let result = match invoke(test, case) {
            Ok(Ok(())) => TestResult::Pass {
                duration: start.elapsed(),
            },
            Ok(Err(failure)) => TestResult::Fail {
                failure,
                duration: start.elapsed(),
            },
            Err(message) => TestResult::Panicked {
                message,
                duration: start.elapsed(),
            },
        };
        tracing::debug!(test = test.name(), pass = result.is_pass(), "test finished");
        result
    }
}

/// Invoke one operation with its attribution frame pushed, catching panics
fn invoke<T>(operation: &Operation<T>, case: &mut T) -> Result<Outcome, String> {
    let _scope = enter_operation(operation.name(), operation.site());
    panic::catch_unwind(AssertUnwindSafe(|| operation.invoke(case))).map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn site_token<T>(operation: &Operation<T>) -> String {
    let site = operation.site();
    format!("{}:{}", site.file(), site.line())
}
