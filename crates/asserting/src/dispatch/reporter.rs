//! Test reporter - display dispatch results

use crate::dispatch::runner::{Report, TestResult, TestRun};
use asserting_config::Config;
use colored::*;
use std::io::{self, Write};
use std::time::Duration;

/// Test reporter with output configuration
pub struct TestReporter {
    /// Show one line for each test
    verbose: bool,
    /// Disable colored output
    no_color: bool,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TestReporter {
    /// Create a new test reporter
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
        }
    }

    /// Create a reporter from the `[report]` section of asserting.toml
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.verbose()).with_no_color(!config.color())
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Report dispatch results
    pub fn report(&self, report: &Report) {
        if let Some(failure) = &report.setup_failure {
            println!("{} {}", self.paint("BeforeAll failed:".red().bold()), failure);
        }

        for run in &report.runs {
            self.print_test_result(run);
        }

        // Dots need a newline
        if !self.verbose && !report.runs.is_empty() {
            println!();
        }

        println!();
        self.print_summary(report);
        self.print_failures(&report.runs);
    }

    /// Strip styling when color is disabled for this reporter
    fn paint(&self, text: ColoredString) -> ColoredString {
        if self.no_color {
            text.clear()
        } else {
            text
        }
    }

    /// Verbose label and progress dot for a result
    fn markers(&self, result: &TestResult) -> (ColoredString, ColoredString) {
        let (label, dot) = match result {
            TestResult::Pass { .. } => ("PASS".green().bold(), ".".green()),
            TestResult::Fail { .. } => ("FAIL".red().bold(), "F".red().bold()),
            TestResult::Panicked { .. } => ("PANIC".red().bold(), "P".red().bold()),
            TestResult::Skipped => ("SKIP".yellow().bold(), "S".yellow().bold()),
        };
        (self.paint(label), self.paint(dot))
    }

    /// Print a single test result
    fn print_test_result(&self, run: &TestRun) {
        let (label, dot) = self.markers(&run.result);

        if self.verbose {
            println!("{} {} ({:.2?})", label, run.name, run.result.duration());
        } else {
            print!("{}", dot);
            let _ = io::stdout().flush();
        }
    }

    /// Print summary statistics
    fn print_summary(&self, report: &Report) {
        let total = report.runs.len();
        let passed = report.passed();
        let failed = report.failed();
        let total_duration: Duration = report.runs.iter().map(|r| r.result.duration()).sum();

        println!("{}", "─".repeat(50));

        let status = if report.is_success() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        let failed_count = if failed > 0 {
            failed.to_string().red().bold()
        } else {
            failed.to_string().normal()
        };

        println!(
            "Test result: {} | {} total, {} passed, {} failed",
            self.paint(status),
            self.paint(total.to_string().bold()),
            self.paint(passed.to_string().green().bold()),
            self.paint(failed_count)
        );
        println!("Time: {:.2?}", total_duration);
    }

    /// Print details of failed tests
    fn print_failures(&self, runs: &[TestRun]) {
        let failures: Vec<_> = runs.iter().filter(|r| r.result.is_fail()).collect();

        if failures.is_empty() {
            return;
        }

        println!();
        println!("{}", self.paint("Failures:".red().bold()));
        println!();

        for run in failures {
            println!("  {} {}", self.paint("●".red()), run.site);
            println!("    {}", self.paint(run.name.bold()));
            if let Some(reason) = run.result.reason() {
                for line in reason.lines() {
                    println!("      {}", self.paint(line.dimmed()));
                }
            }
            println!();
        }
    }
}
