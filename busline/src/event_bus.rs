//! Core event bus implementation.
//!
//! This module provides [`EventBus`], the registry and dispatcher. It maps each
//! concrete event type to a dispatch list of [`InvocationUnit`]s kept sorted by
//! priority, and fires events through those lists synchronously.
//!
//! Dispatch lists are copy-on-write: writers publish a complete, sorted
//! replacement and readers iterate whatever snapshot they loaded, so a firing
//! never observes a half-updated list and never waits on a registration.

use crate::builder::BusBuilder;
use crate::error::{HandlerError, RegistrationError, RegistrationResult};
use crate::event::{Event, EventType};
use crate::factory::UnitFactory;
use crate::family::FamilyType;
use crate::listener::{Listener, ListenerId};
use crate::reporter::{FailureReporter, HandlerFailure};
use crate::unit::InvocationUnit;

use arc_swap::ArcSwap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration options for the EventBus.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusConfig {
    /// Number of event types the registry has room for before it reallocates.
    pub initial_capacity: usize,

    /// Maximum number of handlers per event type. `None` means unbounded.
    pub max_handlers_per_event: Option<usize>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            max_handlers_per_event: None,
        }
    }
}

/// Priority-sorted units for one concrete event type.
struct DispatchList {
    event_type: EventType,
    units: ArcSwap<Vec<InvocationUnit>>,
}

impl DispatchList {
    fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            units: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

/// Units built for one event type during a registration, not yet installed.
struct PendingUnits {
    event_type: EventType,
    units: Vec<InvocationUnit>,
}

/// The event bus for one event family `E` and one listener family `L`.
///
/// Both families are trait-object types. Listeners register their handler
/// methods with [`register_listener`](Self::register_listener); events are
/// dispatched by their concrete runtime type with
/// [`fire_event`](Self::fire_event).
///
/// Handlers run in ascending [`Priority`](crate::Priority) order; handlers with
/// equal priority run in registration order. A handler that panics or returns
/// an error is reported to the bus's [`FailureReporter`] and the remaining
/// handlers still run.
///
/// # Examples
///
/// ```rust
/// use busline::{listener, new_event_bus, EventBus};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// pub trait AppEvent: busline::Event {}
/// pub trait AppListener: Send + Sync {}
///
/// #[derive(Default)]
/// pub struct Tick {
///     seen: AtomicUsize,
/// }
/// impl AppEvent for Tick {}
///
/// pub struct Ticker;
/// impl AppListener for Ticker {}
///
/// #[listener(events = dyn AppEvent, family = dyn AppListener)]
/// impl Ticker {
///     #[subscribe(priority = 1)]
///     pub fn on_tick(&self, tick: &Tick) {
///         tick.seen.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let bus: EventBus<dyn AppEvent, dyn AppListener> = new_event_bus().unwrap();
/// bus.register_listener(&Arc::new(Ticker)).unwrap();
///
/// let tick = Tick::default();
/// bus.fire_event(&tick);
/// assert_eq!(tick.seen.load(Ordering::SeqCst), 1);
/// ```
pub struct EventBus<E: ?Sized, L: ?Sized> {
    /// Configuration for this event bus.
    config: BusConfig,

    /// The event family every fired event belongs to.
    event_family: FamilyType,

    /// The listener family every registered listener belongs to.
    listener_family: FamilyType,

    /// Dispatch lists by concrete event type.
    lists: RwLock<HashMap<TypeId, Arc<DispatchList>>>,

    /// Serializes register, unregister and clear.
    writer: Mutex<()>,

    /// Builds units and caches their invocation paths.
    factory: UnitFactory,

    /// Receives handler failures.
    reporter: Arc<dyn FailureReporter<E>>,

    _families: PhantomData<fn(&E, &L)>,
}

impl<E: ?Sized + Event, L: ?Sized + 'static> EventBus<E, L> {
    /// Starts building a bus for these families.
    pub fn builder() -> BusBuilder<E, L> {
        BusBuilder::new()
    }

    pub(crate) fn from_parts(
        config: BusConfig,
        event_family: FamilyType,
        listener_family: FamilyType,
        reporter: Arc<dyn FailureReporter<E>>,
    ) -> Self {
        Self {
            lists: RwLock::new(HashMap::with_capacity(config.initial_capacity)),
            config,
            event_family,
            listener_family,
            writer: Mutex::new(()),
            factory: UnitFactory::new(),
            reporter,
            _families: PhantomData,
        }
    }

    /// Registers every handler method of `listener`.
    ///
    /// All units are built before any dispatch list changes, so on error
    /// nothing is installed. Handler names must be unique within the
    /// listener type, since the invocation path of a method is cached by name. Each dispatch list the listener touches is
    /// re-sorted once, however many of its handlers land there.
    ///
    /// Registering the same instance twice installs its handlers twice.
    ///
    /// # Returns
    ///
    /// The number of handlers installed.
    pub fn register_listener<T>(&self, listener: &Arc<T>) -> RegistrationResult<usize>
    where
        T: Listener<E, L>,
    {
        let methods = T::handler_methods();
        for (index, method) in methods.iter().enumerate() {
            if methods[..index].iter().any(|seen| seen.name() == method.name()) {
                return Err(RegistrationError::duplicate_handler(method.method_ref()));
            }
        }

        let mut pending: Vec<PendingUnits> = Vec::new();
        for method in methods {
            let unit = self.factory.build_unit(listener, &method)?;
            let event_type = method.event_type();
            match pending.iter_mut().find(|p| p.event_type == event_type) {
                Some(group) => group.units.push(unit),
                None => pending.push(PendingUnits {
                    event_type,
                    units: vec![unit],
                }),
            }
        }

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(max) = self.config.max_handlers_per_event {
            for group in &pending {
                let count = self.handler_count_for(group.event_type.id()) + group.units.len();
                if count > max {
                    return Err(RegistrationError::too_many_handlers(
                        group.event_type.name(),
                        count,
                        max,
                    ));
                }
            }
        }

        let mut installed = 0;
        for group in pending {
            let list = self.list_or_insert(group.event_type);
            let current = list.units.load();

            let mut next = Vec::with_capacity(current.len() + group.units.len());
            next.extend(current.iter().cloned());
            installed += group.units.len();
            next.extend(group.units);
            next.sort_by_key(InvocationUnit::priority);

            list.units.store(Arc::new(next));
        }

        debug!(
            listener = %ListenerId::of(listener),
            handlers = installed,
            "registered listener"
        );
        Ok(installed)
    }

    /// Removes every handler bound to `listener`, across all event types.
    ///
    /// Matching is by instance identity: another `Arc` holding an equal value
    /// is a different listener.
    ///
    /// # Returns
    ///
    /// The number of handlers removed.
    pub fn unregister_listener<T>(&self, listener: &Arc<T>) -> usize
    where
        T: Listener<E, L>,
    {
        let owner = Arc::as_ptr(listener) as *const () as usize;
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut removed = 0;
        for list in self.snapshot_lists() {
            let current = list.units.load();
            if !current.iter().any(|unit| unit.is_bound_to(owner)) {
                continue;
            }

            let kept: Vec<InvocationUnit> = current
                .iter()
                .filter(|unit| !unit.is_bound_to(owner))
                .cloned()
                .collect();
            removed += current.len() - kept.len();
            list.units.store(Arc::new(kept));
        }

        debug!(
            listener = %ListenerId::of(listener),
            handlers = removed,
            "unregistered listener"
        );
        removed
    }

    /// Dispatches `event` to every handler of its concrete type.
    ///
    /// Handlers run on the calling thread in priority order. A failing handler
    /// is reported and skipped; it never aborts the dispatch and never reaches
    /// the caller. Firing a type nobody handles does nothing.
    ///
    /// # Returns
    ///
    /// The same event, for chaining.
    pub fn fire_event<'a>(&self, event: &'a E) -> &'a E {
        let Some(list) = self.list_for(event.concrete_type_id()) else {
            return event;
        };
        let payload = event.as_any();

        let units = list.units.load_full();
        trace!(
            event = list.event_type.name(),
            handlers = units.len(),
            "dispatching event"
        );

        for unit in units.iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit.invoke(payload)))
                .unwrap_or_else(|panic| Err(HandlerError::from_panic(panic)));

            if let Err(error) = outcome {
                self.reporter
                    .report(&HandlerFailure::new(unit, event, &error));
            }
        }

        event
    }

    /// Returns the number of handlers for events of concrete type `P`.
    pub fn handler_count<P: Any>(&self) -> usize {
        self.handler_count_for(TypeId::of::<P>())
    }

    /// Returns the number of handlers for the concrete event type `type_id`.
    pub fn handler_count_for(&self, type_id: TypeId) -> usize {
        self.list_for(type_id)
            .map_or(0, |list| list.units.load().len())
    }

    /// Returns the number of handlers across all event types.
    pub fn total_handler_count(&self) -> usize {
        self.snapshot_lists()
            .iter()
            .map(|list| list.units.load().len())
            .sum()
    }

    /// Returns whether any handler is bound to `listener`.
    pub fn is_registered<T: Any>(&self, listener: &Arc<T>) -> bool {
        let owner = Arc::as_ptr(listener) as *const () as usize;
        self.snapshot_lists()
            .iter()
            .any(|list| list.units.load().iter().any(|unit| unit.is_bound_to(owner)))
    }

    /// Removes every handler of every listener.
    pub fn clear(&self) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        lists.clear();
        debug!("cleared all listeners");
    }

    /// Returns the event family of this bus.
    pub fn event_family(&self) -> FamilyType {
        self.event_family
    }

    /// Returns the listener family of this bus.
    pub fn listener_family(&self) -> FamilyType {
        self.listener_family
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Returns the factory that builds this bus's invocation units.
    pub fn unit_factory(&self) -> &UnitFactory {
        &self.factory
    }

    // Private helper methods

    fn list_for(&self, type_id: TypeId) -> Option<Arc<DispatchList>> {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        lists.get(&type_id).cloned()
    }

    fn list_or_insert(&self, event_type: EventType) -> Arc<DispatchList> {
        if let Some(list) = self.list_for(event_type.id()) {
            return list;
        }
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            lists
                .entry(event_type.id())
                .or_insert_with(|| Arc::new(DispatchList::new(event_type))),
        )
    }

    fn snapshot_lists(&self) -> Vec<Arc<DispatchList>> {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        lists.values().cloned().collect()
    }
}

impl<E: ?Sized, L: ?Sized> fmt::Debug for EventBus<E, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_family", &self.event_family.name())
            .field("listener_family", &self.listener_family.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
