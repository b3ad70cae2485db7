//! Bus construction and validation.

use crate::error::{ConfigError, ConfigResult};
use crate::event::Event;
use crate::event_bus::{BusConfig, EventBus};
use crate::family::{FamilyRole, FamilyType};
use crate::reporter::{FailureReporter, LogReporter};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Builder for configuring [`EventBus`] instances.
///
/// Both families must be set explicitly; [`build`](Self::build) checks that
/// each is a trait-object type and is the type the bus is parameterized with.
///
/// # Examples
///
/// ```rust
/// use busline::{EventBus, FamilyType};
///
/// pub trait AppEvent: busline::Event {}
/// pub trait AppListener: Send + Sync {}
///
/// let bus = EventBus::<dyn AppEvent, dyn AppListener>::builder()
///     .event_family(FamilyType::of::<dyn AppEvent>())
///     .listener_family(FamilyType::of::<dyn AppListener>())
///     .with_capacity(16)
///     .build()
///     .expect("valid families");
///
/// assert_eq!(bus.config().initial_capacity, 16);
/// ```
pub struct BusBuilder<E: ?Sized, L: ?Sized> {
    event_family: Option<FamilyType>,
    listener_family: Option<FamilyType>,
    config: BusConfig,
    reporter: Option<Arc<dyn FailureReporter<E>>>,
    _families: PhantomData<fn(&E, &L)>,
}

impl<E: ?Sized + Event, L: ?Sized + 'static> BusBuilder<E, L> {
    /// Creates a builder with no families and the default configuration.
    pub fn new() -> Self {
        Self {
            event_family: None,
            listener_family: None,
            config: BusConfig::default(),
            reporter: None,
            _families: PhantomData,
        }
    }

    /// Sets the event family.
    pub fn event_family(mut self, family: FamilyType) -> Self {
        self.event_family = Some(family);
        self
    }

    /// Sets the listener family.
    pub fn listener_family(mut self, family: FamilyType) -> Self {
        self.listener_family = Some(family);
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the initial capacity of the registry.
    ///
    /// # Arguments
    /// * `capacity` - Number of event types to reserve room for
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Sets the maximum number of handlers per event type.
    ///
    /// # Arguments
    /// * `max_handlers` - Registrations that would exceed this are rejected
    pub fn with_max_handlers_per_event(mut self, max_handlers: usize) -> Self {
        self.config.max_handlers_per_event = Some(max_handlers);
        self
    }

    /// Sets where handler failures go. Defaults to [`LogReporter`].
    pub fn with_reporter<R>(mut self, reporter: Arc<R>) -> Self
    where
        R: FailureReporter<E> + 'static,
    {
        self.reporter = Some(reporter as Arc<dyn FailureReporter<E>>);
        self
    }

    /// Validates the families and builds the bus.
    ///
    /// # Errors
    ///
    /// Checks run in this order and the first failure is returned:
    /// a family is unset ([`ConfigError::MissingEventFamily`],
    /// [`ConfigError::MissingListenerFamily`]), a family is not a trait-object
    /// type ([`ConfigError::NotInterface`]), or a family is not the type the
    /// bus is parameterized with ([`ConfigError::FamilyMismatch`]).
    pub fn build(self) -> ConfigResult<EventBus<E, L>> {
        let event_family = self.event_family.ok_or(ConfigError::MissingEventFamily)?;
        let listener_family = self
            .listener_family
            .ok_or(ConfigError::MissingListenerFamily)?;

        check_interface(FamilyRole::Event, event_family)?;
        check_interface(FamilyRole::Listener, listener_family)?;
        check_matches::<E>(FamilyRole::Event, event_family)?;
        check_matches::<L>(FamilyRole::Listener, listener_family)?;

        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(LogReporter) as Arc<dyn FailureReporter<E>>);

        debug!(
            event_family = event_family.name(),
            listener_family = listener_family.name(),
            "built event bus"
        );
        Ok(EventBus::from_parts(
            self.config,
            event_family,
            listener_family,
            reporter,
        ))
    }
}

impl<E: ?Sized + Event, L: ?Sized + 'static> Default for BusBuilder<E, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized, L: ?Sized> fmt::Debug for BusBuilder<E, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusBuilder")
            .field("event_family", &self.event_family)
            .field("listener_family", &self.listener_family)
            .field("config", &self.config)
            .field("custom_reporter", &self.reporter.is_some())
            .finish()
    }
}

fn check_interface(role: FamilyRole, family: FamilyType) -> ConfigResult<()> {
    if family.is_interface() {
        Ok(())
    } else {
        Err(ConfigError::not_interface(role, family.name()))
    }
}

fn check_matches<T: ?Sized + Any>(role: FamilyRole, family: FamilyType) -> ConfigResult<()> {
    let expected = FamilyType::of::<T>();
    if family.id() == expected.id() {
        Ok(())
    } else {
        Err(ConfigError::family_mismatch(role, expected.name(), family.name()))
    }
}

/// Builds a bus whose families are its own type parameters.
///
/// Equivalent to setting both families on [`EventBus::builder`] from `E` and
/// `L`, so the only possible error is a family that is not a `dyn Trait` type.
pub fn new_event_bus<E, L>() -> ConfigResult<EventBus<E, L>>
where
    E: ?Sized + Event,
    L: ?Sized + 'static,
{
    BusBuilder::new()
        .event_family(FamilyType::of::<E>())
        .listener_family(FamilyType::of::<L>())
        .build()
}
