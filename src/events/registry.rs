//! Listener registry
//!
//! In-process multicast from the coordinator to zero or more listeners.
//!
//! The registry keeps a `Weak` reference to each listener: callers own their
//! listeners and a dropped listener is pruned on the next dispatch. Each
//! dispatch works on a snapshot of the registrations taken when it starts,
//! and the registry lock is released before any callback runs, so a listener
//! may subscribe or unsubscribe from inside its own callback. Every delivery
//! re-checks that the registration is still active, so an unsubscribed
//! listener receives nothing further, even later in the same dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use super::listener::SessionListener;

/// Handle returned by [`ListenerRegistry::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    listener: Weak<dyn SessionListener>,
    active: AtomicBool,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    entries: Vec<Arc<Registration>>,
}

/// Registry of session listeners, in registration order
#[derive(Default)]
pub struct ListenerRegistry {
    inner: Mutex<RegistryInner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener without taking ownership of it
    pub fn subscribe<L>(&self, listener: &Arc<L>) -> ListenerId
    where
        L: SessionListener + 'static,
    {
        let weak: Weak<dyn SessionListener> = Arc::downgrade(listener) as Weak<dyn SessionListener>;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.entries.push(Arc::new(Registration {
            id,
            listener: weak,
            active: AtomicBool::new(true),
        }));
        debug!(listener = id.0, "listener subscribed");
        id
    }

    /// Remove a registration; returns `false` if it was not registered
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pos) = inner.entries.iter().position(|r| r.id == id) else {
            return false;
        };
        let registration = inner.entries.remove(pos);
        registration.active.store(false, Ordering::SeqCst);
        debug!(listener = id.0, "listener unsubscribed");
        true
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .iter()
            .filter(|r| r.listener.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registrations as of now, reusable for several deliveries of one event
    pub fn snapshot(&self) -> Snapshot<'_> {
        let entries = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.entries.clone()
        };
        Snapshot {
            registry: self,
            entries,
        }
    }

    fn prune(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.retain(|r| {
            let alive = r.listener.strong_count() > 0;
            if !alive {
                r.active.store(false, Ordering::SeqCst);
                debug!(listener = r.id.0, "pruned dropped listener");
            }
            alive
        });
    }
}

/// Fixed set of registrations taken by [`ListenerRegistry::snapshot`]
///
/// Listeners subscribed after the snapshot receive none of its deliveries.
pub struct Snapshot<'a> {
    registry: &'a ListenerRegistry,
    entries: Vec<Arc<Registration>>,
}

impl Snapshot<'_> {
    pub fn deliver(&self, deliver: impl Fn(&dyn SessionListener)) {
        let mut saw_dropped = false;
        for registration in &self.entries {
            if !registration.active.load(Ordering::SeqCst) {
                continue;
            }
            match registration.listener.upgrade() {
                Some(listener) => deliver(listener.as_ref()),
                None => saw_dropped = true,
            }
        }

        if saw_dropped {
            self.registry.prune();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InstallSession, ModuleName, SessionId};
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<SessionId>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<SessionId> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl SessionListener for Recorder {
        fn on_session_changed(&self, session: &InstallSession) {
            self.seen.lock().unwrap().push(session.session_id);
        }
    }

    /// Unsubscribes itself on the first event it sees
    struct OneShot {
        registry: Arc<ListenerRegistry>,
        id: OnceLock<ListenerId>,
        seen: Mutex<usize>,
    }

    impl SessionListener for OneShot {
        fn on_session_changed(&self, _session: &InstallSession) {
            *self.seen.lock().unwrap() += 1;
            if let Some(id) = self.id.get() {
                self.registry.unsubscribe(*id);
            }
        }
    }

    fn session(id: u64) -> InstallSession {
        InstallSession::pending(
            SessionId::Assigned(id),
            [ModuleName::unchecked("image_feature")].into(),
        )
    }

    fn publish(registry: &ListenerRegistry, session: &InstallSession) {
        registry.snapshot().deliver(|l| l.on_session_changed(session));
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        struct Tagged(&'static str, Arc<Mutex<Vec<&'static str>>>);
        impl SessionListener for Tagged {
            fn on_session_changed(&self, _session: &InstallSession) {
                self.1.lock().unwrap().push(self.0);
            }
        }

        let first = Arc::new(Tagged("first", order.clone()));
        let second = Arc::new(Tagged("second", order.clone()));
        registry.subscribe(&first);
        registry.subscribe(&second);

        publish(&registry, &session(1));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let id = registry.subscribe(&recorder);

        publish(&registry, &session(1));
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        publish(&registry, &session(2));

        assert_eq!(recorder.seen(), vec![SessionId::Assigned(1)]);
    }

    #[test]
    fn test_self_unsubscribe_inside_callback() {
        let registry = Arc::new(ListenerRegistry::new());
        let before = Arc::new(Recorder::default());
        let one_shot = Arc::new(OneShot {
            registry: registry.clone(),
            id: OnceLock::new(),
            seen: Mutex::new(0),
        });
        let after = Arc::new(Recorder::default());

        registry.subscribe(&before);
        let id = registry.subscribe(&one_shot);
        one_shot.id.set(id).unwrap();
        registry.subscribe(&after);

        publish(&registry, &session(1));
        publish(&registry, &session(2));

        assert_eq!(*one_shot.seen.lock().unwrap(), 1);
        assert_eq!(before.seen().len(), 2);
        assert_eq!(after.seen().len(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_late_subscriber_gets_no_past_events() {
        let registry = ListenerRegistry::new();
        publish(&registry, &session(1));

        let recorder = Arc::new(Recorder::default());
        registry.subscribe(&recorder);
        assert!(recorder.seen().is_empty());
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let registry = ListenerRegistry::new();
        let kept = Arc::new(Recorder::default());
        registry.subscribe(&kept);
        {
            let dropped = Arc::new(Recorder::default());
            registry.subscribe(&dropped);
            assert_eq!(registry.len(), 2);
        }

        publish(&registry, &session(1));
        assert_eq!(registry.len(), 1);
        assert_eq!(kept.seen().len(), 1);
    }

    #[test]
    fn test_snapshot_excludes_later_subscribers() {
        let registry = ListenerRegistry::new();
        let early = Arc::new(Recorder::default());
        registry.subscribe(&early);

        let snapshot = registry.snapshot();
        let late = Arc::new(Recorder::default());
        registry.subscribe(&late);

        snapshot.deliver(|l| l.on_session_changed(&session(1)));
        snapshot.deliver(|l| l.on_session_changed(&session(2)));

        assert_eq!(
            early.seen(),
            vec![SessionId::Assigned(1), SessionId::Assigned(2)]
        );
        assert!(late.seen().is_empty());
    }
}
