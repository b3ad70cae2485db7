//! Listener capability and handler descriptors.
//!
//! A listener is any `Send + Sync` type whose handler methods are described by
//! [`Listener::handler_methods`]. The `#[listener]` attribute generates that
//! description from `#[subscribe]` methods; it can also be written by hand.

use crate::error::{BoxError, HandlerError, HandlerResult};
use crate::event::EventType;
use crate::factory;
use crate::priority::Priority;
use crate::unit::Invoker;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type whose handler methods can be registered on an
/// [`EventBus<E, L>`](crate::EventBus).
///
/// `E` is the event family and `L` the listener family of the bus. The
/// `#[listener]` macro checks at compile time that the implementing type
/// coerces to `L` and that every handler parameter coerces to `E`.
///
/// # Manual Implementation
///
/// ```rust
/// use busline::{HandlerMethod, Listener, Priority};
///
/// pub trait AppEvent: busline::Event {}
/// pub trait AppListener: Send + Sync {}
///
/// pub struct Started;
/// impl AppEvent for Started {}
///
/// pub struct Greeter;
/// impl AppListener for Greeter {}
///
/// impl Greeter {
///     pub fn on_started(&self, _event: &Started) {}
/// }
///
/// impl Listener<dyn AppEvent, dyn AppListener> for Greeter {
///     fn handler_methods() -> Vec<HandlerMethod<Self>> {
///         vec![HandlerMethod::<Self>::new::<Started, ()>(
///             "on_started",
///             Priority::NORMAL,
///             |this, event| this.on_started(event),
///         )]
///     }
/// }
///
/// assert_eq!(<Greeter as Listener<dyn AppEvent, dyn AppListener>>::handler_methods().len(), 1);
/// ```
pub trait Listener<E: ?Sized, L: ?Sized>: Send + Sync + Sized + 'static {
    /// Returns the handler descriptors of this type, in declaration order.
    fn handler_methods() -> Vec<HandlerMethod<Self>>;
}

/// What a handler method may return.
///
/// `()` for handlers that cannot fail, or `Result<(), Err>` for handlers that
/// report failures as values. Either way the bus only sees success or a
/// [`HandlerError`].
pub trait HandlerReturn: 'static {
    /// Converts the handler's return value into a dispatch outcome.
    fn into_handler_result(self) -> HandlerResult<()>;
}

impl HandlerReturn for () {
    fn into_handler_result(self) -> HandlerResult<()> {
        Ok(())
    }
}

impl<Err> HandlerReturn for Result<(), Err>
where
    Err: Into<BoxError> + 'static,
{
    fn into_handler_result(self) -> HandlerResult<()> {
        self.map_err(HandlerError::failed)
    }
}

/// Descriptor of one handler method of listener type `T`.
///
/// Holds the method name, the concrete event type it handles, its priority and
/// a typed pointer to the method. Building the descriptor is cheap; the
/// [`UnitFactory`](crate::UnitFactory) turns it into an invocation path once per
/// listener type and method.
pub struct HandlerMethod<T> {
    name: &'static str,
    event_type: EventType,
    priority: Priority,
    specialize: Box<dyn Fn() -> Invoker + Send + Sync>,
    _listener: PhantomData<fn(&T)>,
}

impl<T: Send + Sync + 'static> HandlerMethod<T> {
    /// Describes `method`, a handler for events of concrete type `P`.
    pub fn new<P: Any, R: HandlerReturn>(
        name: &'static str,
        priority: Priority,
        method: fn(&T, &P) -> R,
    ) -> Self {
        Self {
            name,
            event_type: EventType::of::<P>(),
            priority,
            specialize: Box::new(move || factory::specialize(method)),
            _listener: PhantomData,
        }
    }

    /// Returns the method name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the concrete event type this method handles.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns the declared priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the identity of this method.
    pub fn method_ref(&self) -> MethodRef {
        MethodRef::new(std::any::type_name::<T>(), self.name)
    }

    pub(crate) fn specialize(&self) -> Invoker {
        (self.specialize)()
    }
}

impl<T> fmt::Debug for HandlerMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("listener", &std::any::type_name::<T>())
            .field("name", &self.name)
            .field("event_type", &self.event_type.name())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Identity of a handler method: its listener type and method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    listener: &'static str,
    name: &'static str,
}

impl MethodRef {
    pub(crate) fn new(listener: &'static str, name: &'static str) -> Self {
        Self { listener, name }
    }

    /// Returns the full name of the listener type.
    pub fn listener_type(&self) -> &'static str {
        self.listener
    }

    /// Returns the method name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", short_type_name(self.listener), self.name)
    }
}

/// Identity of a registered listener instance.
///
/// Two ids are equal only when they refer to the same allocation; structurally
/// equal listeners in different `Arc`s are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    addr: usize,
    type_name: &'static str,
}

impl ListenerId {
    /// Returns the identity of the instance behind `listener`.
    pub fn of<T: Any>(listener: &Arc<T>) -> Self {
        Self::from_raw(
            Arc::as_ptr(listener) as *const () as usize,
            std::any::type_name::<T>(),
        )
    }

    pub(crate) fn from_raw(addr: usize, type_name: &'static str) -> Self {
        Self { addr, type_name }
    }

    /// Returns the full name of the listener type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", short_type_name(self.type_name), self.addr)
    }
}

/// Strips the module path from a type name, keeping generic arguments intact.
pub(crate) fn short_type_name(name: &'static str) -> &'static str {
    let head = name.find('<').map_or(name, |generics| &name[..generics]);
    match head.rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}
