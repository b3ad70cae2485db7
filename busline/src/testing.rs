//! Testing utilities for busline applications.
//!
//! [`RecordingReporter`] captures every handler failure so tests can assert on
//! what went wrong without scraping logs.

use crate::event::Event;
use crate::listener::{ListenerId, MethodRef};
use crate::reporter::{FailureReporter, HandlerFailure};
use std::sync::{Mutex, PoisonError};

/// Owned record of one reported handler failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// The listener whose handler failed.
    pub listener: ListenerId,

    /// The handler method.
    pub method: MethodRef,

    /// Concrete type name of the event being dispatched.
    pub event_type: &'static str,

    /// Rendered error.
    pub message: String,

    /// Whether the handler panicked rather than returning an error.
    pub panicked: bool,
}

/// A [`FailureReporter`] that keeps every failure in memory.
///
/// # Examples
///
/// ```rust
/// use busline::testing::RecordingReporter;
/// use busline::{listener, EventBus, FamilyType};
/// use std::sync::Arc;
///
/// pub trait AppEvent: busline::Event {}
/// pub trait AppListener: Send + Sync {}
///
/// pub struct Request;
/// impl AppEvent for Request {}
///
/// pub struct Strict;
/// impl AppListener for Strict {}
///
/// #[listener(events = dyn AppEvent, family = dyn AppListener)]
/// impl Strict {
///     #[subscribe]
///     pub fn on_request(&self, _request: &Request) -> Result<(), String> {
///         Err("unauthorized".into())
///     }
/// }
///
/// let reporter = Arc::new(RecordingReporter::new());
/// let bus = EventBus::<dyn AppEvent, dyn AppListener>::builder()
///     .event_family(FamilyType::of::<dyn AppEvent>())
///     .listener_family(FamilyType::of::<dyn AppListener>())
///     .with_reporter(Arc::clone(&reporter))
///     .build()
///     .unwrap();
///
/// bus.register_listener(&Arc::new(Strict)).unwrap();
/// bus.fire_event(&Request);
///
/// let failures = reporter.failures();
/// assert_eq!(failures.len(), 1);
/// assert_eq!(failures[0].method.name(), "on_request");
/// assert!(failures[0].message.contains("unauthorized"));
/// ```
#[derive(Debug, Default)]
pub struct RecordingReporter {
    failures: Mutex<Vec<FailureRecord>>,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every failure recorded so far, oldest first.
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.lock().clone()
    }

    /// Returns how many failures were recorded.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether nothing failed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forgets every recorded failure.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FailureRecord>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: ?Sized + Event> FailureReporter<E> for RecordingReporter {
    fn report(&self, failure: &HandlerFailure<'_, E>) {
        let record = FailureRecord {
            listener: failure.listener(),
            method: failure.method(),
            event_type: failure.event().event_type_name(),
            message: failure.error().to_string(),
            panicked: failure.error().is_panic(),
        };
        self.lock().push(record);
    }
}
