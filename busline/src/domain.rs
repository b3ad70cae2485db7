//! Isolation domains.
//!
//! One [`IsolationDomain`] exists per listener type while any of its units is
//! alive. It owns the cache of specialized invocation paths for that type, so
//! all instances of the type share one path per handler method.
//!
//! Ownership runs one way only: units hold paths, paths hold their domain, and
//! the domain (like the factory above it) holds weak references. Dropping the
//! last unit of a listener type therefore releases its paths and the domain
//! together.

use crate::error::RegistrationError;
use crate::listener::HandlerMethod;
use crate::unit::SpecializedPath;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Cache of specialized invocation paths for one listener type.
pub struct IsolationDomain {
    listener_type: &'static str,
    paths: Mutex<HashMap<&'static str, Weak<SpecializedPath>>>,
}

impl IsolationDomain {
    pub(crate) fn new(listener_type: &'static str) -> Self {
        Self {
            listener_type,
            paths: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the full name of the listener type this domain serves.
    pub fn listener_type(&self) -> &'static str {
        self.listener_type
    }

    /// Returns how many specialized paths are currently in use.
    pub fn live_paths(&self) -> usize {
        let paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
        paths.values().filter(|path| path.strong_count() > 0).count()
    }

    /// Returns the path for `method`, specializing it on first use.
    ///
    /// Fails when a path cached under the same method name handles a different
    /// event type than `method` declares.
    pub(crate) fn path_for<T: Send + Sync + 'static>(
        self: &Arc<Self>,
        method: &HandlerMethod<T>,
    ) -> Result<Arc<SpecializedPath>, RegistrationError> {
        let mut paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(path) = paths.get(method.name()).and_then(Weak::upgrade) {
            if path.event_type() != method.event_type() {
                return Err(RegistrationError::signature_mismatch(
                    method.method_ref(),
                    path.event_type().name(),
                    method.event_type().name(),
                ));
            }
            return Ok(path);
        }

        let path = Arc::new(SpecializedPath::new(
            method.method_ref(),
            method.event_type(),
            method.specialize(),
            Arc::clone(self),
        ));
        paths.retain(|_, cached| cached.strong_count() > 0);
        paths.insert(method.name(), Arc::downgrade(&path));
        Ok(path)
    }
}

impl fmt::Debug for IsolationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsolationDomain")
            .field("listener_type", &self.listener_type)
            .field("live_paths", &self.live_paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::Priority;

    struct Ping;
    struct Pong;

    struct Sentry;

    impl Sentry {
        fn on_ping(&self, _event: &Ping) {}
        fn on_pong(&self, _event: &Pong) {}
    }

    fn ping_method() -> HandlerMethod<Sentry> {
        HandlerMethod::<Sentry>::new::<Ping, ()>("on_ping", Priority::NORMAL, |this, event| {
            this.on_ping(event)
        })
    }

    #[test]
    fn test_path_is_reused_while_alive() {
        let domain = Arc::new(IsolationDomain::new(std::any::type_name::<Sentry>()));

        let first = domain.path_for(&ping_method()).unwrap();
        let second = domain.path_for(&ping_method()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(domain.live_paths(), 1);

        drop(first);
        drop(second);
        assert_eq!(domain.live_paths(), 0);
    }

    #[test]
    fn test_signature_mismatch_is_rejected() {
        let domain = Arc::new(IsolationDomain::new(std::any::type_name::<Sentry>()));
        let _ping = domain.path_for(&ping_method()).unwrap();

        // Same method name, different parameter type.
        let impostor = HandlerMethod::<Sentry>::new::<Pong, ()>("on_ping", Priority::NORMAL, |this, event| {
            this.on_pong(event)
        });
        let error = domain.path_for(&impostor).unwrap_err();
        assert!(matches!(error, RegistrationError::SignatureMismatch { .. }));
    }

    #[test]
    fn test_path_debug_names_method_and_event() {
        let domain = Arc::new(IsolationDomain::new(std::any::type_name::<Sentry>()));
        let path = domain.path_for(&ping_method()).unwrap();

        let rendered = format!("{:?}", path);
        assert!(rendered.starts_with("SpecializedPath"));
        assert!(rendered.contains("\"on_ping\""));
        assert!(rendered.contains("Ping"));
    }

    #[test]
    fn test_paths_keep_domain_alive() {
        let domain = Arc::new(IsolationDomain::new(std::any::type_name::<Sentry>()));
        let weak = Arc::downgrade(&domain);

        let path = domain.path_for(&ping_method()).unwrap();
        drop(domain);
        assert!(weak.upgrade().is_some());

        drop(path);
        assert!(weak.upgrade().is_none());
    }
}
