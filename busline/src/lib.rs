//! # Busline - In-Process Publish/Subscribe Dispatch
//!
//! Busline routes events to handler methods of registered listener objects.
//! A bus is bound to an *event family* and a *listener family*, both trait
//! objects; events are dispatched by their concrete runtime type, in priority
//! order, on the firing thread.
//!
//! ## Features
//!
//! - **Discovered Handlers**: `#[listener]` turns `#[subscribe]` methods into handler descriptors
//! - **Shared Invocation Paths**: one specialized call path per listener type and method, reclaimed with its last user
//! - **Priority Ordering**: lower priority values run first, ties keep registration order
//! - **Failure Isolation**: a panicking or failing handler never stops the others
//! - **Thread-Safe**: register, unregister and fire from any thread
//!
//! ## Quick Start
//!
//! ```rust
//! use busline::{listener, new_event_bus, EventBus};
//! use std::sync::{Arc, Mutex};
//!
//! // Families are plain traits.
//! pub trait GameEvent: busline::Event {}
//! pub trait GameListener: Send + Sync {}
//!
//! pub struct PlayerJoined {
//!     pub name: String,
//! }
//! impl GameEvent for PlayerJoined {}
//!
//! #[derive(Default)]
//! pub struct Lobby {
//!     players: Mutex<Vec<String>>,
//! }
//! impl GameListener for Lobby {}
//!
//! #[listener(events = dyn GameEvent, family = dyn GameListener)]
//! impl Lobby {
//!     #[subscribe(priority = -10)]
//!     pub fn on_join(&self, event: &PlayerJoined) {
//!         self.players.lock().unwrap().push(event.name.clone());
//!     }
//! }
//!
//! let bus: EventBus<dyn GameEvent, dyn GameListener> =
//!     new_event_bus().expect("families are trait objects");
//!
//! let lobby = Arc::new(Lobby::default());
//! bus.register_listener(&lobby).unwrap();
//!
//! bus.fire_event(&PlayerJoined { name: "ada".into() });
//! assert_eq!(*lobby.players.lock().unwrap(), vec!["ada".to_string()]);
//!
//! bus.unregister_listener(&lobby);
//! bus.fire_event(&PlayerJoined { name: "bob".into() });
//! assert_eq!(lobby.players.lock().unwrap().len(), 1);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Lets macro output name `::busline` from inside this crate too.
extern crate self as busline;

// Re-export the attribute macro
pub use busline_derive::listener;

// Core modules
pub mod builder;
pub mod domain;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod factory;
pub mod family;
pub mod listener;
pub mod priority;
pub mod reporter;
pub mod testing;
pub mod unit;

// Re-exports for convenience
pub use builder::{new_event_bus, BusBuilder};
pub use domain::IsolationDomain;
pub use error::*;
pub use event::{Event, EventType};
pub use event_bus::{BusConfig, EventBus};
pub use factory::UnitFactory;
pub use family::{FamilyRole, FamilyType};
pub use listener::{HandlerMethod, HandlerReturn, Listener, ListenerId, MethodRef};
pub use priority::Priority;
pub use reporter::{FailureReporter, HandlerFailure, LogReporter};
pub use unit::InvocationUnit;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{ConfigError, HandlerError, RegistrationError};
    pub use crate::listener;
    pub use crate::{new_event_bus, BusBuilder, BusConfig, Event, EventBus, FamilyType};
    pub use crate::{FailureReporter, HandlerFailure, Listener, LogReporter, Priority};
}

/// Version information for the busline library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod test_builder;

#[cfg(test)]
mod test_thread_safe;
