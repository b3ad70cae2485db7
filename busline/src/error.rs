//! Error types for busline.
//!
//! This module defines the errors that can occur while building a bus,
//! registering listeners and invoking handlers.

use crate::family::FamilyRole;
use crate::listener::MethodRef;
use std::any::Any;
use thiserror::Error;

/// Boxed error produced by a fallible handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by [`BusBuilder::build`](crate::BusBuilder::build).
///
/// Configuration errors are fatal: no bus is returned when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The event family type was never set.
    #[error("event family type is not set")]
    MissingEventFamily,

    /// The listener family type was never set.
    #[error("listener family type is not set")]
    MissingListenerFamily,

    /// A family type carries state of its own instead of being a trait object.
    #[error("{role} family `{name}` is not an interface (expected a `dyn Trait` type)")]
    NotInterface {
        /// Which family was rejected.
        role: FamilyRole,
        /// The rejected type name.
        name: &'static str,
    },

    /// The configured family differs from the type the bus is parameterized with.
    #[error("{role} family mismatch: bus expects `{expected}`, builder was given `{actual}`")]
    FamilyMismatch {
        /// Which family was rejected.
        role: FamilyRole,
        /// The family type of the bus.
        expected: &'static str,
        /// The family type passed to the builder.
        actual: &'static str,
    },
}

/// Errors returned by [`EventBus::register_listener`](crate::EventBus::register_listener).
///
/// A failed registration installs none of the listener's handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The invocation path cached for this method handles a different event type.
    #[error("cannot specialize {method}: cached path handles `{cached}`, handler declares `{declared}`")]
    SignatureMismatch {
        /// The handler method.
        method: MethodRef,
        /// Event type of the already cached path.
        cached: &'static str,
        /// Event type declared by the handler being registered.
        declared: &'static str,
    },

    /// Two handler descriptors of one listener type share a method name.
    #[error("duplicate handler {method}: method names must be unique per listener type")]
    DuplicateHandler {
        /// The handler method declared more than once.
        method: MethodRef,
    },

    /// Installing the handlers would exceed the configured per-event limit.
    #[error("too many handlers for `{event}`: {count} (max: {max})")]
    TooManyHandlers {
        /// The event type whose list is full.
        event: &'static str,
        /// Handler count the list would reach.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Errors raised by a single handler invocation.
///
/// These never escape [`EventBus::fire_event`](crate::EventBus::fire_event);
/// they are handed to the bus's [`FailureReporter`](crate::FailureReporter).
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler panicked.
    #[error("handler panicked: {message}")]
    Panicked {
        /// The panic message, if it was a string.
        message: String,
    },

    /// A fallible handler returned an error.
    #[error("handler failed: {0}")]
    Failed(#[source] BoxError),

    /// The event passed to the unit was not of the handler's parameter type.
    #[error("event type mismatch: handler expects `{expected}`")]
    EventMismatch {
        /// The handler's parameter type.
        expected: &'static str,
    },

    /// The bound instance was not of the handler's listener type.
    #[error("listener type mismatch: handler expects `{expected}`")]
    ListenerMismatch {
        /// The handler's listener type.
        expected: &'static str,
    },
}

/// Convenience type alias for bus construction results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for registration results.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Convenience type alias for handler invocation results.
pub type HandlerResult<T> = Result<T, HandlerError>;

impl ConfigError {
    /// Creates a new not-interface error.
    pub fn not_interface(role: FamilyRole, name: &'static str) -> Self {
        Self::NotInterface { role, name }
    }

    /// Creates a new family mismatch error.
    pub fn family_mismatch(role: FamilyRole, expected: &'static str, actual: &'static str) -> Self {
        Self::FamilyMismatch {
            role,
            expected,
            actual,
        }
    }
}

impl RegistrationError {
    /// Creates a new signature mismatch error.
    pub fn signature_mismatch(
        method: MethodRef,
        cached: &'static str,
        declared: &'static str,
    ) -> Self {
        Self::SignatureMismatch {
            method,
            cached,
            declared,
        }
    }

    /// Creates a new duplicate handler error.
    pub fn duplicate_handler(method: MethodRef) -> Self {
        Self::DuplicateHandler { method }
    }

    /// Creates a new too many handlers error.
    pub fn too_many_handlers(event: &'static str, count: usize, max: usize) -> Self {
        Self::TooManyHandlers { event, count, max }
    }
}

impl HandlerError {
    /// Creates a new failed error from anything convertible into a boxed error.
    pub fn failed<E: Into<BoxError>>(error: E) -> Self {
        Self::Failed(error.into())
    }

    /// Creates a new panicked error.
    pub fn panicked<S: Into<String>>(message: S) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    /// Converts a payload caught by `catch_unwind` into an error.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::Panicked { message }
    }

    /// Returns whether the handler panicked rather than returning an error.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::MissingEventFamily.to_string(),
            "event family type is not set"
        );

        let error = ConfigError::not_interface(FamilyRole::Listener, "demo::Concrete");
        assert_eq!(
            error.to_string(),
            "listener family `demo::Concrete` is not an interface (expected a `dyn Trait` type)"
        );

        let error = RegistrationError::duplicate_handler(MethodRef::new("demo::Lobby", "on_join"));
        assert_eq!(
            error.to_string(),
            "duplicate handler Lobby::on_join: method names must be unique per listener type"
        );

        let error = RegistrationError::too_many_handlers("demo::Simple", 3, 2);
        assert_eq!(error.to_string(), "too many handlers for `demo::Simple`: 3 (max: 2)");
    }

    #[test]
    fn test_from_panic_payloads() {
        let error = HandlerError::from_panic(Box::new("static message"));
        assert_eq!(error.to_string(), "handler panicked: static message");

        let error = HandlerError::from_panic(Box::new(String::from("owned message")));
        assert!(matches!(error, HandlerError::Panicked { ref message } if message == "owned message"));

        let error = HandlerError::from_panic(Box::new(42u8));
        assert!(error.is_panic());
        assert_eq!(error.to_string(), "handler panicked: unknown panic");
    }

    #[test]
    fn test_failed_keeps_source() {
        let error = HandlerError::failed("disk full");
        assert!(!error.is_panic());
        assert_eq!(error.to_string(), "handler failed: disk full");
        assert!(std::error::Error::source(&error).is_some());
    }
}
