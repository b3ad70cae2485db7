//! Priority system for handlers.
//!
//! Every handler carries an integer priority. Within one dispatch list,
//! handlers with a **lower** value run **earlier**; handlers with equal
//! values run in the order they were registered.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Execution priority of a handler.
///
/// Lower values run first. The named levels are spaced so custom values can be
/// slotted between them.
///
/// # Examples
///
/// ```rust
/// use busline::Priority;
///
/// let monitor = Priority::LAST;
/// let custom = Priority::new(-10);
///
/// assert!(Priority::EARLY.runs_before(custom));
/// assert!(custom.runs_before(Priority::NORMAL));
/// assert!(Priority::NORMAL.runs_before(monitor));
/// assert_eq!(Priority::default(), Priority::NORMAL);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Priority(i32);

impl Priority {
    /// Runs before everything else.
    pub const FIRST: Priority = Priority(i32::MIN);

    /// Runs before normal handlers.
    pub const EARLY: Priority = Priority(-100);

    /// The default priority.
    pub const NORMAL: Priority = Priority(0);

    /// Runs after normal handlers.
    pub const LATE: Priority = Priority(100);

    /// Runs after everything else; meant for handlers that only observe the outcome.
    pub const LAST: Priority = Priority(i32::MAX);

    /// Creates a priority from its numeric value.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the numeric value of this priority.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns whether a handler with this priority runs before one with `other`.
    pub const fn runs_before(self, other: Priority) -> bool {
        self.0 < other.0
    }

    /// Returns whether a handler with this priority runs after one with `other`.
    pub const fn runs_after(self, other: Priority) -> bool {
        self.0 > other.0
    }

    /// Returns the name of a named level, if this is one.
    pub const fn level_name(self) -> Option<&'static str> {
        match self.0 {
            i32::MIN => Some("FIRST"),
            -100 => Some("EARLY"),
            0 => Some("NORMAL"),
            100 => Some("LATE"),
            i32::MAX => Some("LAST"),
            _ => None,
        }
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}
