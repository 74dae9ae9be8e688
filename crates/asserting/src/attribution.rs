//! Failure-site attribution
//!
//! Assertions report failures from inside this crate, so the innermost frame of
//! a failure is never interesting to the reader. The resolver walks a chain of
//! frames outward from the failing predicate, drops frames that live in the
//! assertion machinery's directories, stops at the harness entry point, and
//! returns the deepest remaining frame as a `file:line` token.
//!
//! Frames come from two places:
//! - the predicate's caller, captured at compile time through `#[track_caller]`
//! - the operations the dispatcher is currently running on this thread
//!
//! An operation frame only knows where the operation was registered. A caller
//! the rules keep is taken to be the operation body, so it is fused with the
//! innermost operation into one frame carrying the caller's line. The
//! registration site is only reported when the caller itself is excluded.

use crate::convention::{is_entry_point, short_name};
use asserting_config::loader::{DEFAULT_HARNESS_FILES, DEFAULT_INTERNAL_DIRS};
use asserting_config::Config;
use std::cell::RefCell;
use std::panic::Location;
use std::path::Path;

/// File token of a frame without source information
pub const UNKNOWN_FILE: &str = "<unknown>";

/// One entry of a call chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Source path as reported by the compiler
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// Enclosing function, possibly module-qualified; empty when unknown
    pub function: String,
}

impl Frame {
    /// Create a frame record
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    /// A frame with no source information; ends any walk that reaches it
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FILE, 0, "")
    }

    /// Build a frame from a compiler-captured location
    pub fn from_location(location: &Location<'_>, function: impl Into<String>) -> Self {
        Self::new(location.file(), location.line(), function)
    }

    /// Whether this frame carries source information
    pub fn has_source(&self) -> bool {
        !self.file.is_empty() && self.file != UNKNOWN_FILE
    }

    /// Name of the directory holding the file, if the path has one
    pub fn dir_name(&self) -> Option<&str> {
        Path::new(&self.file)
            .parent()
            .and_then(|parent| parent.file_name())
            .and_then(|name| name.to_str())
    }

    /// File name without its directories
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }

    /// `file:line` token used in failure messages
    pub fn token(&self) -> String {
        format!("{}:{}", self.file_name(), self.line)
    }
}

/// Which frames belong to the assertion machinery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionRules {
    internal_dirs: Vec<String>,
    harness_files: Vec<String>,
}

impl Default for AttributionRules {
    fn default() -> Self {
        Self {
            internal_dirs: DEFAULT_INTERNAL_DIRS.iter().map(|d| d.to_string()).collect(),
            harness_files: DEFAULT_HARNESS_FILES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl AttributionRules {
    /// Rules with explicit internal directories and harness files
    pub fn new(internal_dirs: Vec<String>, harness_files: Vec<String>) -> Self {
        Self {
            internal_dirs,
            harness_files,
        }
    }

    /// Rules from the `[attribution]` section of asserting.toml
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.internal_dirs(), config.harness_files())
    }

    /// Directory names treated as internal
    pub fn internal_dirs(&self) -> &[String] {
        &self.internal_dirs
    }

    /// Whether a frame is dropped from the candidate list
    pub fn is_excluded(&self, frame: &Frame) -> bool {
        let internal = frame
            .dir_name()
            .is_some_and(|dir| self.internal_dirs.iter().any(|d| d == dir));
        internal && !self.harness_files.iter().any(|f| f == frame.file_name())
    }
}

/// Walk `frames` innermost first and return the deepest user-code token.
///
/// The walk stops at a frame without source information (which is not added)
/// and after the first frame whose function is a harness entry point.
pub fn resolve_failure_site<I>(frames: I, rules: &AttributionRules) -> Option<String>
where
    I: IntoIterator<Item = Frame>,
{
    let mut candidates = Vec::new();

    for frame in frames {
        if !frame.has_source() {
            tracing::trace!("attribution: frame without source info, stopping");
            break;
        }

        if rules.is_excluded(&frame) {
            tracing::trace!(file = %frame.file, line = frame.line, "attribution: skipping internal frame");
        } else {
            candidates.push(frame.token());
        }

        let name = short_name(&frame.function);
        if is_entry_point(name) {
            tracing::trace!(function = name, "attribution: reached entry point");
            break;
        }
    }

    candidates.pop()
}

/// A captured chain of frames, innermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallChain {
    frames: Vec<Frame>,
}

impl CallChain {
    /// Chain over explicit frames, innermost first
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Capture the caller's location followed by the active operations
    #[track_caller]
    pub fn capture(rules: &AttributionRules) -> Self {
        let mut caller = Frame::from_location(Location::caller(), "");
        let mut frames = Vec::new();
        ACTIVE_OPERATIONS.with(|active| {
            let active = active.borrow();
            let mut outer = active.iter().rev();
            match outer.next() {
                Some(innermost) if rules.is_excluded(&caller) => {
                    frames.push(caller);
                    frames.push(innermost.clone());
                }
                Some(innermost) => {
                    caller.function = innermost.function.clone();
                    frames.push(caller);
                }
                None => frames.push(caller),
            }
            frames.extend(outer.cloned());
        });
        Self { frames }
    }

    /// Frames of this chain, innermost first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Resolve the failure site for this chain
    pub fn resolve(&self, rules: &AttributionRules) -> Option<String> {
        resolve_failure_site(self.frames.iter().cloned(), rules)
    }
}

thread_local! {
    static ACTIVE_OPERATIONS: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Marks an operation as running on this thread until dropped
#[derive(Debug)]
pub(crate) struct OperationScope {
    _private: (),
}

/// Push a frame for the operation `name`, registered at `site`
pub(crate) fn enter_operation(name: &str, site: &'static Location<'static>) -> OperationScope {
    ACTIVE_OPERATIONS.with(|active| {
        active.borrow_mut().push(Frame::from_location(site, name));
    });
    OperationScope { _private: () }
}

impl Drop for OperationScope {
    fn drop(&mut self) {
        ACTIVE_OPERATIONS.with(|active| {
            active.borrow_mut().pop();
        });
    }
}
