//! Operation registry - classify a test case's operations into a dispatch plan

use crate::convention::Role;
use crate::failure::{DispatchError, Outcome};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::panic::Location;

/// Body of an operation: runs against the test case, may fail
pub type OperationFn<T> = fn(&mut T) -> Outcome;

/// A named operation exposed by a test case
pub struct Operation<T> {
    name: Cow<'static, str>,
    body: OperationFn<T>,
    site: &'static Location<'static>,
}

impl<T> Operation<T> {
    /// Register an operation; the call site is kept for failure attribution
    #[track_caller]
    pub fn new(name: impl Into<Cow<'static, str>>, body: OperationFn<T>) -> Self {
        Self {
            name: name.into(),
            body,
            site: Location::caller(),
        }
    }

    /// Name of the operation (e.g., "TestAddition")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role derived from the name, if any
    pub fn role(&self) -> Option<Role> {
        Role::classify(&self.name)
    }

    /// Where the operation was registered
    pub fn site(&self) -> &'static Location<'static> {
        self.site
    }

    pub(crate) fn invoke(&self, case: &mut T) -> Outcome {
        (self.body)(case)
    }
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            body: self.body,
            site: self.site,
        }
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("site", &format_args!("{}:{}", self.site.file(), self.site.line()))
            .finish()
    }
}

/// A test case: a value that lists its own operations
///
/// Operations are returned in the order they should be discovered. Names
/// follow the convention in [`crate::convention`]; anything else is ignored.
pub trait Suite: Sized {
    /// All operations of this test case
    fn operations() -> Vec<Operation<Self>>;
}

/// Classified operations of one test case, ready to execute
#[derive(Debug)]
pub struct Plan<T> {
    /// The setup-once hook, if any
    pub setup_once: Option<Operation<T>>,
    /// The setup-per-test hook, if any
    pub setup_each: Option<Operation<T>>,
    /// Test operations in discovery order
    pub tests: Vec<Operation<T>>,
}

impl<T> Default for Plan<T> {
    fn default() -> Self {
        Self {
            setup_once: None,
            setup_each: None,
            tests: Vec::new(),
        }
    }
}

impl<T: Suite> Plan<T> {
    /// Discover the operations of `T` and classify them
    pub fn discover() -> Result<Self, DispatchError> {
        Self::from_operations(T::operations())
    }
}

impl<T> Plan<T> {
    /// Classify operations by name prefix
    ///
    /// Two operations with the same name, or two hooks of the same role, are
    /// rejected.
    pub fn from_operations(operations: Vec<Operation<T>>) -> Result<Self, DispatchError> {
        let mut plan = Plan::default();
        let mut seen = HashSet::new();

        for operation in operations {
            if !seen.insert(operation.name().to_string()) {
                return Err(DispatchError::DuplicateName {
                    name: operation.name().to_string(),
                });
            }

            match operation.role() {
                Some(Role::Test) => plan.tests.push(operation),
                Some(role @ (Role::SetupOnce | Role::SetupEach)) => {
                    let slot = if role == Role::SetupOnce {
                        &mut plan.setup_once
                    } else {
                        &mut plan.setup_each
                    };
                    if let Some(first) = slot.as_ref() {
                        return Err(DispatchError::DuplicateHook {
                            role,
                            first: first.name().to_string(),
                            second: operation.name().to_string(),
                        });
                    }
                    *slot = Some(operation);
                }
                None => {
                    tracing::trace!(name = operation.name(), "ignoring operation without a role");
                }
            }
        }

        Ok(plan)
    }

    /// Keep only tests whose name contains `pattern`
    pub fn filter(mut self, pattern: &str) -> Self {
        self.tests.retain(|t| t.name().contains(pattern));
        self
    }

    /// Check if the plan has any tests
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Get count of tests
    pub fn len(&self) -> usize {
        self.tests.len()
    }
}

/// Build a `Vec<Operation<Self>>` from `"Name" => body` pairs
///
/// ```
/// use asserting::{operations, Operation, Outcome, Suite, TestCase};
///
/// #[derive(Default)]
/// struct Arithmetic {
///     t: TestCase,
/// }
///
/// impl Arithmetic {
///     fn test_addition(&mut self) -> Outcome {
///         self.t.assert(2 + 2 == 4)
///     }
/// }
///
/// impl Suite for Arithmetic {
///     fn operations() -> Vec<Operation<Self>> {
///         operations!["TestAddition" => Self::test_addition]
///     }
/// }
/// ```
#[macro_export]
macro_rules! operations {
    ($($name:expr => $body:expr),* $(,)?) => {
        ::std::vec![$($crate::Operation::new($name, $body)),*]
    };
}
