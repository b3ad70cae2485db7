//! Handler failure reporting.
//!
//! The bus never propagates a handler failure to the caller of
//! [`fire_event`](crate::EventBus::fire_event). It hands each one to the
//! [`FailureReporter`] it was built with and moves on to the next handler.

use crate::error::HandlerError;
use crate::event::Event;
use crate::listener::{ListenerId, MethodRef};
use crate::unit::InvocationUnit;
use tracing::warn;

/// One failed handler invocation.
#[derive(Debug)]
pub struct HandlerFailure<'a, E: ?Sized> {
    listener: ListenerId,
    method: MethodRef,
    event: &'a E,
    error: &'a HandlerError,
}

impl<'a, E: ?Sized> HandlerFailure<'a, E> {
    pub(crate) fn new(unit: &InvocationUnit, event: &'a E, error: &'a HandlerError) -> Self {
        Self {
            listener: unit.listener(),
            method: unit.method(),
            event,
            error,
        }
    }

    /// Returns the listener whose handler failed.
    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Returns the handler method that failed.
    pub fn method(&self) -> MethodRef {
        self.method
    }

    /// Returns the event being dispatched.
    pub fn event(&self) -> &'a E {
        self.event
    }

    /// Returns what went wrong.
    pub fn error(&self) -> &'a HandlerError {
        self.error
    }
}

/// Receives handler failures from a bus.
///
/// Implementations must not panic; a panicking reporter unwinds out of
/// `fire_event`.
pub trait FailureReporter<E: ?Sized>: Send + Sync {
    /// Called once for every failed handler invocation, on the firing thread.
    fn report(&self, failure: &HandlerFailure<'_, E>);
}

/// Default reporter: logs each failure as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl<E: ?Sized + Event> FailureReporter<E> for LogReporter {
    fn report(&self, failure: &HandlerFailure<'_, E>) {
        warn!(
            event = failure.event().event_type_name(),
            listener = %failure.listener(),
            method = %failure.method(),
            error = %failure.error(),
            "failed to pass event to handler"
        );
    }
}
