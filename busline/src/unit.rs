//! Invocation units.
//!
//! An [`InvocationUnit`] binds one listener instance to the specialized
//! invocation path of one of its handler methods. Units are what dispatch lists
//! hold; cloning one is two reference-count increments.

use crate::domain::IsolationDomain;
use crate::error::HandlerResult;
use crate::event::EventType;
use crate::listener::{ListenerId, MethodRef};
use crate::priority::Priority;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Erased owner of a unit: the listener instance it is bound to.
pub(crate) type Owner = Arc<dyn Any + Send + Sync>;

/// Synthesized call of one handler method: casts the owner to the listener
/// type, casts the event to the parameter type, and calls the method directly.
pub(crate) type Invoker =
    Box<dyn Fn(&(dyn Any + Send + Sync), &dyn Any) -> HandlerResult<()> + Send + Sync>;

/// The invocation path of one (listener type, handler method) pair.
///
/// Built once by the [`UnitFactory`](crate::UnitFactory) and shared by every
/// unit bound to an instance of that listener type.
pub(crate) struct SpecializedPath {
    method: MethodRef,
    event_type: EventType,
    invoker: Invoker,
    // Keeps the owning domain alive for as long as any unit uses this path.
    _domain: Arc<IsolationDomain>,
}

impl SpecializedPath {
    pub(crate) fn new(
        method: MethodRef,
        event_type: EventType,
        invoker: Invoker,
        domain: Arc<IsolationDomain>,
    ) -> Self {
        Self {
            method,
            event_type,
            invoker,
            _domain: domain,
        }
    }

    pub(crate) fn method(&self) -> MethodRef {
        self.method
    }

    pub(crate) fn event_type(&self) -> EventType {
        self.event_type
    }
}

impl fmt::Debug for SpecializedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecializedPath")
            .field("method", &self.method)
            .field("event_type", &self.event_type.name())
            .finish_non_exhaustive()
    }
}

/// A handler method bound to one listener instance.
///
/// Exposes [`invoke`](Self::invoke), the identity of the bound listener and
/// the handler's priority.
#[derive(Clone)]
pub struct InvocationUnit {
    owner: Owner,
    path: Arc<SpecializedPath>,
    priority: Priority,
}

impl InvocationUnit {
    pub(crate) fn new(owner: Owner, path: Arc<SpecializedPath>, priority: Priority) -> Self {
        Self {
            owner,
            path,
            priority,
        }
    }

    /// Calls the handler with `event`.
    ///
    /// `event` must be of the handler's concrete parameter type, otherwise
    /// [`HandlerError::EventMismatch`](crate::HandlerError::EventMismatch) is
    /// returned and the handler is not run.
    /// Panics raised by the handler propagate; the bus catches them per unit.
    pub fn invoke(&self, event: &dyn Any) -> HandlerResult<()> {
        (self.path.invoker)(&*self.owner, event)
    }

    /// Returns the identity of the bound listener instance.
    pub fn listener(&self) -> ListenerId {
        ListenerId::from_raw(
            Arc::as_ptr(&self.owner) as *const () as usize,
            self.path.method.listener_type(),
        )
    }

    /// Returns the handler's priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the identity of the handler method.
    pub fn method(&self) -> MethodRef {
        self.path.method()
    }

    /// Returns the concrete event type the handler accepts.
    pub fn event_type(&self) -> EventType {
        self.path.event_type()
    }

    /// Returns whether both units run through the same specialized path.
    pub fn shares_path_with(&self, other: &InvocationUnit) -> bool {
        Arc::ptr_eq(&self.path, &other.path)
    }

    pub(crate) fn is_bound_to(&self, owner: usize) -> bool {
        Arc::as_ptr(&self.owner) as *const () as usize == owner
    }
}

impl fmt::Debug for InvocationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationUnit")
            .field("listener", &self.listener())
            .field("method", &self.method())
            .field("event_type", &self.event_type().name())
            .field("priority", &self.priority)
            .finish()
    }
}
