//! Core event trait and event type identity.
//!
//! Every `'static` type is an [`Event`]. An *event family* is a trait with
//! `Event` as a supertrait; the bus is parameterized with the family's trait
//! object type and routes on the concrete type behind it.

use std::any::{Any, TypeId};
use std::fmt;

/// Capability every event family trait extends.
///
/// Implemented for all `'static` types, so a family is declared simply as
///
/// ```rust
/// pub trait GameEvent: busline::Event {}
/// ```
///
/// and concrete events opt in with `impl GameEvent for PlayerJoined {}`.
/// Through the supertrait the bus can reach the concrete type behind a
/// `&dyn GameEvent` without knowing it statically.
pub trait Event: Any {
    /// Returns this event as `&dyn Any` for downcasting to its concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the `TypeId` of the concrete runtime type.
    fn concrete_type_id(&self) -> TypeId;

    /// Returns the name of the concrete runtime type.
    fn event_type_name(&self) -> &'static str;
}

impl<T: Any> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn event_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Identity of a concrete event type, the key of a dispatch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Returns the identity of `P`.
    pub fn of<P: Any>() -> Self {
        Self {
            id: TypeId::of::<P>(),
            name: std::any::type_name::<P>(),
        }
    }

    /// Returns the type id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the full type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
