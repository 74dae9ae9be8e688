//! Test bodies defined away from their registration

use asserting::{Outcome, TestCase};

#[derive(Default)]
pub struct Split {
    pub t: TestCase,
    pub body_line: u32,
    pub helper_line: u32,
}

impl Split {
    pub fn test_fails_in_body(&mut self) -> Outcome {
        self.body_line = line!() + 1;
        self.t.assert(false)
    }

    pub fn test_fails_in_helper(&mut self) -> Outcome {
        check_positive(&self.t, -1, &mut self.helper_line)
    }
}

/// Plain helper in user code; its own line is the failure site
pub fn check_positive(t: &TestCase, value: i64, line: &mut u32) -> Outcome {
    *line = line!() + 1;
    t.assertf(value > 0, "value is not positive")
}
