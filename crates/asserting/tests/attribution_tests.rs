//! Failure-site attribution tests

mod assert;
mod bodies;
mod common;

use asserting::{
    dispatch, is_entry_point, is_test_name, operations, resolve_failure_site, AttributionRules,
    Frame, Operation, Outcome, Plan, Suite, TestCase, TestResult,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn rules() -> AttributionRules {
    AttributionRules::default()
}

// ============================================================================
// Entry point names
// ============================================================================

#[rstest]
#[case("Test", "Test", true)]
#[case("TestFoo", "Test", true)]
#[case("TestHTTP", "Test", true)]
#[case("Test_under", "Test", true)]
#[case("Testicular", "Test", false)]
#[case("Tes", "Test", false)]
#[case("Benchmark", "Benchmark", true)]
#[case("BenchmarkSort", "Benchmark", true)]
#[case("Benchmarking", "Benchmark", false)]
#[case("Example", "Example", true)]
#[case("ExampleUsage", "Example", true)]
#[case("Examples", "Example", false)]
fn test_entry_point_names(#[case] name: &str, #[case] prefix: &str, #[case] expected: bool) {
    assert_eq!(is_test_name(name, prefix), expected);
}

#[rstest]
#[case("TestLogin", true)]
#[case("BenchmarkParse", true)]
#[case("ExampleClient", true)]
#[case("Testicular", false)]
#[case("helper", false)]
#[case("", false)]
fn test_any_entry_point(#[case] name: &str, #[case] expected: bool) {
    assert_eq!(is_entry_point(name), expected);
}

// ============================================================================
// Synthetic chains
// ============================================================================

#[test]
fn test_internal_frames_never_reported() {
    common::init_tracing();
    let frames = vec![
        Frame::new("pkg/assert/assert.rs", 40, "assert::TestCase::assert"),
        Frame::new("pkg/require/require.rs", 12, "require::must"),
        Frame::new("app/tests/login.rs", 27, "login::TestLogin"),
    ];

    assert_eq!(
        resolve_failure_site(frames, &rules()),
        Some("login.rs:27".to_string())
    );
}

#[test]
fn test_all_frames_internal_gives_nothing() {
    let frames = vec![
        Frame::new("pkg/assert/assert.rs", 40, "fail"),
        Frame::new("pkg/mock/server.rs", 8, "serve"),
    ];

    assert_eq!(resolve_failure_site(frames, &rules()), None);
}

#[test]
fn test_walk_stops_after_entry_point() {
    let frames = vec![
        Frame::new("app/tests/helpers.rs", 5, "helpers::check_login"),
        Frame::new("app/tests/login.rs", 30, "login::TestLogin"),
        Frame::new("std/thread.rs", 99, "std::thread::run"),
    ];

    assert_eq!(
        resolve_failure_site(frames, &rules()),
        Some("login.rs:30".to_string())
    );
}

#[test]
fn test_lowercase_continuation_is_not_an_entry_point() {
    let frames = vec![
        Frame::new("app/tests/body.rs", 3, "Testicular"),
        Frame::new("app/tests/outer.rs", 9, "TestOuter"),
    ];

    assert_eq!(
        resolve_failure_site(frames, &rules()),
        Some("outer.rs:9".to_string())
    );
}

#[test]
fn test_unknown_frame_stops_without_contributing() {
    let frames = vec![
        Frame::new("app/tests/helpers.rs", 5, "check"),
        Frame::unknown(),
        Frame::new("app/tests/login.rs", 30, "TestLogin"),
    ];

    assert_eq!(
        resolve_failure_site(frames, &rules()),
        Some("helpers.rs:5".to_string())
    );
}

#[test]
fn test_harness_file_in_mock_dir_is_reported() {
    let frames = vec![
        Frame::new("pkg/mock/mock.rs", 10, "mock::expect"),
        Frame::new("pkg/mock/mock_test.rs", 22, "TestMock"),
    ];

    assert_eq!(
        resolve_failure_site(frames, &rules()),
        Some("mock_test.rs:22".to_string())
    );
}

#[test]
fn test_custom_internal_dirs() {
    let rules = AttributionRules::new(vec!["support".to_string()], vec![]);
    let frames = vec![
        Frame::new("app/tests/support/fixtures.rs", 4, "load"),
        Frame::new("app/tests/assert/checks.rs", 11, "TestChecks"),
    ];

    assert_eq!(
        resolve_failure_site(frames, &rules),
        Some("checks.rs:11".to_string())
    );
}

// ============================================================================
// Captured chains
// ============================================================================

#[derive(Default)]
struct Located {
    t: TestCase,
    direct_line: u32,
}

impl Located {
    fn test_direct(&mut self) -> Outcome {
        self.direct_line = line!() + 1;
        self.t.assert_equal_int(3, 1 + 1)
    }

    fn test_through_helper(&mut self) -> Outcome {
        assert::check_even(&self.t, 7)
    }

    fn test_passes(&mut self) -> Outcome {
        self.t.assert(true)
    }
}

impl Suite for Located {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "TestDirect" => Self::test_direct,
            "TestThroughHelper" => Self::test_through_helper,
            "TestPasses" => Self::test_passes,
        ]
    }
}

fn failure_location(result: &TestResult) -> Option<String> {
    match result {
        TestResult::Fail { failure, .. } => failure.location.clone(),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_direct_failure_points_at_failing_line() {
    common::init_tracing();
    let mut case = Located::default();

    let report = dispatch(&mut case).unwrap();

    let run = report.run("TestDirect").unwrap();
    assert_eq!(
        failure_location(&run.result),
        Some(format!("attribution_tests.rs:{}", case.direct_line))
    );
    match &run.result {
        TestResult::Fail { failure, .. } => assert_eq!(
            failure.to_string(),
            format!(
                "Expected 2 to equal 3 [attribution_tests.rs:{}]",
                case.direct_line
            )
        ),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_helper_failure_skips_assert_dir() {
    let mut case = Located::default();
    let plan = Plan::<Located>::discover().unwrap();
    let site = plan
        .tests
        .iter()
        .find(|op| op.name() == "TestThroughHelper")
        .map(|op| op.site())
        .unwrap();

    let report = dispatch(&mut case).unwrap();

    // The helper lives in tests/assert/, so the test's registration is reported
    let run = report.run("TestThroughHelper").unwrap();
    assert_eq!(
        failure_location(&run.result),
        Some(format!("attribution_tests.rs:{}", site.line()))
    );
    assert!(report.run("TestPasses").unwrap().result.is_pass());
}

#[test]
fn test_assert_dir_reported_when_not_internal() {
    let t = TestCase::with_rules(AttributionRules::new(vec![], vec![]));
    let failure = assert::check_even(&t, 3).unwrap_err();
    let location = failure.location.unwrap();
    assert!(location.starts_with("mod.rs:"), "got {}", location);
}

impl Suite for bodies::Split {
    fn operations() -> Vec<Operation<Self>> {
        operations![
            "TestFailsInBody" => Self::test_fails_in_body,
            "TestFailsInHelper" => Self::test_fails_in_helper,
        ]
    }
}

#[test]
fn test_body_in_other_file_points_at_failing_line() {
    common::init_tracing();
    let mut case = bodies::Split::default();

    let report = dispatch(&mut case).unwrap();

    assert_eq!(
        failure_location(&report.run("TestFailsInBody").unwrap().result),
        Some(format!("mod.rs:{}", case.body_line))
    );
}

#[test]
fn test_user_helper_in_other_file_points_at_helper_line() {
    let mut case = bodies::Split::default();

    let report = dispatch(&mut case).unwrap();

    assert_eq!(
        failure_location(&report.run("TestFailsInHelper").unwrap().result),
        Some(format!("mod.rs:{}", case.helper_line))
    );
}
