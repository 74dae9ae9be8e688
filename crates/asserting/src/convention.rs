//! Naming convention shared by dispatch and attribution
//!
//! Operation names are matched case-sensitively by prefix:
//! - `Test*`: test operation
//! - `BeforeAll*`: run once before any test
//! - `BeforeEach*`: run before every test

use std::fmt;

/// Prefix marking a test operation
pub const TEST_PREFIX: &str = "Test";

/// Prefix marking the setup-once hook
pub const SETUP_ONCE_PREFIX: &str = "BeforeAll";

/// Prefix marking the setup-per-test hook
pub const SETUP_EACH_PREFIX: &str = "BeforeEach";

/// Prefixes of harness entry points; attribution stops at the first match
pub const ENTRY_POINT_PREFIXES: &[&str] = &["Test", "Benchmark", "Example"];

/// Role of an operation, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Runs exactly once, before any test operation
    SetupOnce,
    /// Runs immediately before every test operation
    SetupEach,
    /// A test operation
    Test,
}

impl Role {
    /// Classify an operation name. Names matching no prefix have no role.
    pub fn classify(name: &str) -> Option<Role> {
        if name.starts_with(SETUP_ONCE_PREFIX) {
            Some(Role::SetupOnce)
        } else if name.starts_with(SETUP_EACH_PREFIX) {
            Some(Role::SetupEach)
        } else if name.starts_with(TEST_PREFIX) {
            Some(Role::Test)
        } else {
            None
        }
    }

    /// The name prefix selecting this role
    pub fn prefix(self) -> &'static str {
        match self {
            Role::SetupOnce => SETUP_ONCE_PREFIX,
            Role::SetupEach => SETUP_EACH_PREFIX,
            Role::Test => TEST_PREFIX,
        }
    }

    /// Whether this role is one of the two hooks
    pub fn is_hook(self) -> bool {
        matches!(self, Role::SetupOnce | Role::SetupEach)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Tells whether `name` looks like an entry point for `prefix`.
///
/// It is one if the name is exactly the prefix, or if the character after the
/// prefix is not lowercase: `Test` and `TestHTTP` are, `Testicular` is not.
pub fn is_test_name(name: &str, prefix: &str) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    match rest.chars().next() {
        None => true,
        Some(next) => !next.is_lowercase(),
    }
}

/// Tells whether a short function name is a test, benchmark or example entry point
pub fn is_entry_point(name: &str) -> bool {
    ENTRY_POINT_PREFIXES
        .iter()
        .any(|prefix| is_test_name(name, prefix))
}

/// Drop the module path: `suite::web::TestLogin` becomes `TestLogin`
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit("::").next().unwrap_or(qualified)
}
