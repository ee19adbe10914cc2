// tinymop error taxonomy
//
// Composition-time errors abort class creation; runtime errors surface at
// the call site. Nothing here is retried, suppressed, or defaulted.
//
// Custom error classes built through the composition pipeline are raised as
// `RaisedError`: a plain Rust error value that carries its ancestor chain
// as data, so catchers can match it against any custom ancestor in O(1)
// while still treating it as an ordinary `std::error::Error`.

use std::backtrace::Backtrace;
use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::class::ClassId;

#[derive(Debug, Error)]
pub enum ObjectError {
    /// C3 merge failed: no ancestor ordering satisfies every parent's own
    /// precedence and the declared parent order.
    #[error("cannot create a consistent method resolution order for `{class}`")]
    InconsistentMro { class: String },

    /// Explicit super lookup was given a defining class that is not an
    /// ancestor of the instance's actual class.
    #[error("class `{class}` is not in the method resolution order of `{instance_class}`")]
    ClassNotInMro {
        class: String,
        instance_class: String,
    },

    /// An unoverridden interface stub was invoked.
    #[error("method `{member}` is not implemented")]
    NotImplemented { member: String },

    /// Malformed composition input or a member used against its kind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lookup of an undeclared member, or a cooperative super chain that
    /// ran past the root without finding another implementation.
    #[error("no member `{member}` in the method resolution order of `{class}`")]
    MemberNotFound { member: String, class: String },

    /// An instance of a custom error class, thrown by application code.
    #[error(transparent)]
    Raised(#[from] RaisedError),
}

/// A raised instance of a custom error class.
///
/// Carries the raising class, a snapshot of its ancestor ids, the resolved
/// `name` and `message`, and a backtrace captured at the raise site. The
/// snapshot makes `is` usable without access to the `ObjectSystem`.
#[derive(Debug)]
pub struct RaisedError {
    pub(crate) class: ClassId,
    pub(crate) class_name: String,
    pub(crate) message: String,
    pub(crate) ancestors: HashSet<ClassId>,
    pub(crate) trace: Backtrace,
}

impl RaisedError {
    /// The most-derived class this error was raised as.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// The error class's `name` member (e.g. `"ValueError"`).
    pub fn name(&self) -> &str {
        &self.class_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// O(1): was this raised as `class` or a subclass of it?
    pub fn is(&self, class: ClassId) -> bool {
        self.ancestors.contains(&class)
    }

    /// Backtrace captured when the error was raised.
    pub fn backtrace(&self) -> &Backtrace {
        &self.trace
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.class_name)
        } else {
            write!(f, "{}: {}", self.class_name, self.message)
        }
    }
}

impl std::error::Error for RaisedError {}
