//! Dispatch protocol tests: discovery, hook ordering, failure isolation

mod common;

use asserting::{
    dispatch, operations, DispatchError, Dispatcher, Failure, Operation, Outcome, Role, Suite,
    TestCase, TestResult,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Recording test case
// ============================================================================

#[derive(Default)]
struct Recorder {
    calls: Vec<&'static str>,
}

impl Recorder {
    fn test_alpha(&mut self) -> Outcome {
        self.calls.push("TestAlpha");
        Ok(())
    }

    fn test_beta(&mut self) -> Outcome {
        self.calls.push("TestBeta");
        Ok(())
    }

    fn test_gamma(&mut self) -> Outcome {
        self.calls.push("TestGamma");
        Ok(())
    }

    fn helper(&mut self) -> Outcome {
        self.calls.push("helper");
        Ok(())
    }

    fn lowercase_test(&mut self) -> Outcome {
        self.calls.push("testLowercase");
        Ok(())
    }
}

impl Suite for Recorder {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "TestAlpha" => Self::test_alpha,
            "helper" => Self::helper,
            "TestBeta" => Self::test_beta,
            "testLowercase" => Self::lowercase_test,
            "TestGamma" => Self::test_gamma,
        ]
    }
}

#[test]
fn test_every_test_operation_runs_once() {
    common::init_tracing();
    let mut case = Recorder::default();

    let report = dispatch(&mut case).unwrap();

    assert_eq!(case.calls, vec!["TestAlpha", "TestBeta", "TestGamma"]);
    assert_eq!(report.runs.len(), 3);
    assert_eq!(report.passed(), 3);
    assert!(report.is_success());
}

#[test]
fn test_dispatch_twice_rediscovers() {
    let mut case = Recorder::default();

    dispatch(&mut case).unwrap();
    dispatch(&mut case).unwrap();

    assert_eq!(case.calls.len(), 6);
}

// ============================================================================
// Hooks
// ============================================================================

#[derive(Default)]
struct Hooked {
    calls: Vec<String>,
    each_count: usize,
}

impl Hooked {
    fn before_all(&mut self) -> Outcome {
        self.calls.push("BeforeAll".to_string());
        Ok(())
    }

    fn before_each(&mut self) -> Outcome {
        self.each_count += 1;
        self.calls.push("BeforeEach".to_string());
        Ok(())
    }

    fn test_one(&mut self) -> Outcome {
        self.calls.push("TestOne".to_string());
        Ok(())
    }

    fn test_two(&mut self) -> Outcome {
        self.calls.push("TestTwo".to_string());
        Ok(())
    }
}

impl Suite for Hooked {
    fn operations() -> Vec<Operation<Self>> {
        // Hooks registered after tests still run first
        operations![
            "TestOne" => Self::test_one,
            "TestTwo" => Self::test_two,
            "BeforeEach" => Self::before_each,
            "BeforeAll" => Self::before_all,
        ]
    }
}

#[test]
fn test_hooks_run_in_protocol_order() {
    common::init_tracing();
    let mut case = Hooked::default();

    let report = dispatch(&mut case).unwrap();

    assert!(report.is_success());
    assert_eq!(
        case.calls,
        vec!["BeforeAll", "BeforeEach", "TestOne", "BeforeEach", "TestTwo"]
    );
    assert_eq!(case.each_count, report.runs.len());
    assert_eq!(
        case.calls.iter().filter(|c| *c == "BeforeAll").count(),
        1
    );
}

#[test]
fn test_each_hook_count_follows_filter() {
    let mut case = Hooked::default();

    let report = Dispatcher::new()
        .with_filter("Two")
        .dispatch(&mut case)
        .unwrap();

    assert_eq!(report.runs.len(), 1);
    assert_eq!(case.each_count, 1);
    assert_eq!(case.calls, vec!["BeforeAll", "BeforeEach", "TestTwo"]);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[derive(Default)]
struct Mixed {
    t: TestCase,
    reached_after_failure: bool,
    ran: Vec<&'static str>,
}

impl Mixed {
    fn test_fails_early(&mut self) -> Outcome {
        self.ran.push("TestFailsEarly");
        self.t.assert(1 + 1 == 3)?;
        self.reached_after_failure = true;
        Ok(())
    }

    fn test_panics(&mut self) -> Outcome {
        self.ran.push("TestPanics");
        let empty: Vec<u8> = Vec::new();
        let _ = empty[3];
        Ok(())
    }

    fn test_passes(&mut self) -> Outcome {
        self.ran.push("TestPasses");
        self.t.assert_equal_int(4, 2 + 2)
    }
}

impl Suite for Mixed {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "TestFailsEarly" => Self::test_fails_early,
            "TestPanics" => Self::test_panics,
            "TestPasses" => Self::test_passes,
        ]
    }
}

#[test]
fn test_failure_aborts_only_its_operation() {
    common::init_tracing();
    let mut case = Mixed::default();

    let report = dispatch(&mut case).unwrap();

    assert_eq!(case.ran, vec!["TestFailsEarly", "TestPanics", "TestPasses"]);
    assert!(!case.reached_after_failure);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 2);

    match &report.run("TestFailsEarly").unwrap().result {
        TestResult::Fail { failure, .. } => {
            assert_eq!(failure.message, "Expected true, got false");
            assert!(failure.location.is_some());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(matches!(
        report.run("TestPanics").unwrap().result,
        TestResult::Panicked { .. }
    ));
}

#[derive(Default)]
struct BrokenSetup {
    tests_run: usize,
}

impl BrokenSetup {
    fn before_all(&mut self) -> Outcome {
        Err(Failure::new("database unreachable"))
    }

    fn test_one(&mut self) -> Outcome {
        self.tests_run += 1;
        Ok(())
    }
}

impl Suite for BrokenSetup {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "BeforeAll" => Self::before_all,
            "TestOne" => Self::test_one,
        ]
    }
}

#[test]
fn test_failed_setup_once_skips_tests() {
    let mut case = BrokenSetup::default();

    let report = dispatch(&mut case).unwrap();

    assert_eq!(case.tests_run, 0);
    assert_eq!(
        report.setup_failure,
        Some(Failure::new("database unreachable"))
    );
    assert_eq!(report.runs.len(), 1);
    assert_eq!(report.runs[0].result, TestResult::Skipped);
    assert!(!report.is_success());
}

#[derive(Default)]
struct FlakySetup {
    t: TestCase,
    each_calls: usize,
    bodies: Vec<&'static str>,
}

impl FlakySetup {
    fn before_each(&mut self) -> Outcome {
        self.each_calls += 1;
        // Only the second setup fails
        self.t.assertf(self.each_calls != 2, "fixture exhausted")
    }

    fn test_first(&mut self) -> Outcome {
        self.bodies.push("TestFirst");
        Ok(())
    }

    fn test_second(&mut self) -> Outcome {
        self.bodies.push("TestSecond");
        Ok(())
    }

    fn test_third(&mut self) -> Outcome {
        self.bodies.push("TestThird");
        Ok(())
    }
}

impl Suite for FlakySetup {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "BeforeEach" => Self::before_each,
            "TestFirst" => Self::test_first,
            "TestSecond" => Self::test_second,
            "TestThird" => Self::test_third,
        ]
    }
}

#[test]
fn test_failed_setup_each_fails_only_its_test() {
    let mut case = FlakySetup::default();

    let report = dispatch(&mut case).unwrap();

    assert_eq!(case.each_calls, 3);
    assert_eq!(case.bodies, vec!["TestFirst", "TestThird"]);
    match &report.run("TestSecond").unwrap().result {
        TestResult::Fail { failure, .. } => {
            assert_eq!(failure.message, "BeforeEach: Assertion failed: fixture exhausted");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(report.passed(), 2);
}

// ============================================================================
// Rejected test cases
// ============================================================================

struct TwoEachHooks;

impl TwoEachHooks {
    fn noop(&mut self) -> Outcome {
        Ok(())
    }
}

impl Suite for TwoEachHooks {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "BeforeEach" => Self::noop,
            "BeforeEachDatabase" => Self::noop,
            "TestOne" => Self::noop,
        ]
    }
}

#[test]
fn test_duplicate_hooks_rejected() {
    let err = dispatch(&mut TwoEachHooks).unwrap_err();

    assert_eq!(
        err,
        DispatchError::DuplicateHook {
            role: Role::SetupEach,
            first: "BeforeEach".to_string(),
            second: "BeforeEachDatabase".to_string(),
        }
    );
}

struct Empty;

impl Suite for Empty {
    fn operations() -> Vec<Operation<Self>> {
        Vec::new()
    }
}

#[test]
fn test_no_operations_is_a_no_op() {
    let report = dispatch(&mut Empty).unwrap();

    assert!(report.runs.is_empty());
    assert!(report.is_success());
}

// ============================================================================
// Host entry point
// ============================================================================

#[test]
fn test_run_passes_quietly() {
    let mut case = Hooked::default();
    let report = asserting::run(&mut case);
    assert_eq!(report.passed(), 2);
}

#[test]
#[should_panic(expected = "1 of 1 test operations failed")]
fn test_run_panics_on_failure() {
    asserting::run(&mut BrokenSetup::default());
}

#[test]
#[should_panic(expected = "Duplicate BeforeEach hooks")]
fn test_run_panics_on_rejected_case() {
    asserting::run(&mut TwoEachHooks);
}
