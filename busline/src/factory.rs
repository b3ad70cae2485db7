//! Unit factory.
//!
//! The [`UnitFactory`] turns a listener instance and one of its
//! [`HandlerMethod`]s into an [`InvocationUnit`]. The expensive part, building
//! the invocation path, happens once per listener type and method inside that
//! type's [`IsolationDomain`]; each further unit only adds an instance handle.

use crate::domain::IsolationDomain;
use crate::error::{HandlerError, RegistrationError};
use crate::listener::{HandlerMethod, HandlerReturn};
use crate::unit::{InvocationUnit, Invoker, Owner};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Builds invocation units and owns the isolation domains behind them.
#[derive(Debug, Default)]
pub struct UnitFactory {
    domains: Mutex<HashMap<TypeId, Weak<IsolationDomain>>>,
}

impl UnitFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `listener` to the invocation path of `method`.
    pub fn build_unit<T: Send + Sync + 'static>(
        &self,
        listener: &Arc<T>,
        method: &HandlerMethod<T>,
    ) -> Result<InvocationUnit, RegistrationError> {
        let path = self.domain_for::<T>().path_for(method)?;
        let owner: Owner = Arc::clone(listener) as Owner;
        Ok(InvocationUnit::new(owner, path, method.priority()))
    }

    /// Returns how many listener types currently have a live domain.
    pub fn domain_count(&self) -> usize {
        let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains.values().filter(|domain| domain.strong_count() > 0).count()
    }

    /// Returns the live domain of listener type `T`, if any.
    pub fn domain_of<T: Any>(&self) -> Option<Arc<IsolationDomain>> {
        let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains.get(&TypeId::of::<T>()).and_then(Weak::upgrade)
    }

    fn domain_for<T: Any>(&self) -> Arc<IsolationDomain> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(domain) = domains.get(&TypeId::of::<T>()).and_then(Weak::upgrade) {
            return domain;
        }

        let domain = Arc::new(IsolationDomain::new(std::any::type_name::<T>()));
        domains.retain(|_, existing| existing.strong_count() > 0);
        domains.insert(TypeId::of::<T>(), Arc::downgrade(&domain));
        domain
    }
}

/// Synthesizes the invocation path for `method`.
///
/// The returned closure is monomorphized for `T` and `P`: two `TypeId`
/// comparisons and a direct call through the method pointer.
pub(crate) fn specialize<T, P, R>(method: fn(&T, &P) -> R) -> Invoker
where
    T: Send + Sync + 'static,
    P: Any,
    R: HandlerReturn,
{
    Box::new(move |owner: &(dyn Any + Send + Sync), event: &dyn Any| {
        let owner = owner
            .downcast_ref::<T>()
            .ok_or_else(|| HandlerError::ListenerMismatch {
                expected: std::any::type_name::<T>(),
            })?;
        let event = event
            .downcast_ref::<P>()
            .ok_or_else(|| HandlerError::EventMismatch {
                expected: std::any::type_name::<P>(),
            })?;
        method(owner, event).into_handler_result()
    })
}
