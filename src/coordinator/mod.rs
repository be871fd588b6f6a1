//! Module delivery coordinator
//!
//! Accepts install, deferred install and deferred uninstall requests, drives
//! sessions through their lifecycle as the backend reports progress, and fans
//! every change out to the registered listeners.
//!
//! ## Concurrency
//!
//! Public operations may be called from any thread. The session store and the
//! installed set sit behind one mutex that is only held while they are being
//! mutated. Each session also has a gate that is held across write-through,
//! side effects and fan-out, so two updates for the same session never
//! interleave while different sessions proceed independently. The gate is
//! dropped once its session reaches a terminal status. Listeners are
//! called with no coordinator lock held except that session's gate, so they
//! may call back into the coordinator for other sessions.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use crate::backend::{BackendNotifier, InstallerBackend, UpdateSink};
use crate::domain::{
    Confirmation, InstallSession, ModuleName, ResolutionHandle, SessionId, SessionStatus,
    display_modules,
};
use crate::error::{Result, request_rejected};
use crate::events::{ListenerId, ListenerRegistry, ReadyToLaunch, SessionListener};
use crate::launcher::{EntryPoint, Launcher, LauncherTable, Presenter};
use crate::session::{InstalledSet, SessionStore};

#[derive(Default)]
struct DeliveryState {
    sessions: SessionStore,
    installed: InstalledSet,
    next_synthetic: u64,
}

/// Client-side coordinator for on-demand module delivery
pub struct DeliveryCoordinator {
    backend: Arc<dyn InstallerBackend>,
    launcher: LauncherTable,
    state: Mutex<DeliveryState>,
    gates: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    listeners: ListenerRegistry,
}

impl DeliveryCoordinator {
    /// Create a coordinator and attach it to `backend`
    ///
    /// The installed set starts from the backend's view of installed modules.
    pub fn new(backend: Arc<dyn InstallerBackend>, launcher: LauncherTable) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let sink: Weak<dyn UpdateSink> = me.clone();
            backend.attach(BackendNotifier::new(sink));

            let installed: InstalledSet = backend.installed_modules().into_iter().collect();
            debug!(installed = installed.len(), "coordinator started");

            Self {
                backend,
                launcher,
                state: Mutex::new(DeliveryState {
                    installed,
                    ..DeliveryState::default()
                }),
                gates: Mutex::new(HashMap::new()),
                listeners: ListenerRegistry::new(),
            }
        })
    }

    /// Request installation of a single module
    ///
    /// If the module is already installed the backend is not contacted: a
    /// synthetic `Installed` session is recorded, published and returned.
    /// Otherwise the request is forwarded and the backend's session id is
    /// returned without waiting for completion.
    pub fn request_install(&self, name: ModuleName) -> Result<SessionId> {
        self.request_install_many(BTreeSet::from([name]))
    }

    /// Request installation of several modules in one session
    ///
    /// Short-circuits only when every module is already installed.
    pub fn request_install_many(&self, names: BTreeSet<ModuleName>) -> Result<SessionId> {
        if let Some(id) = self.short_circuit(&names) {
            return Ok(id);
        }

        let modules = display_modules(&names);
        let session_id = self.backend.start_install(&names).map_err(|rejected| {
            warn!(modules = %modules, cause = %rejected, "install request rejected");
            request_rejected(&modules, rejected.cause)
        })?;

        self.lock_state()
            .sessions
            .insert_if_absent(InstallSession::pending(session_id, names));
        info!(session = %session_id, modules = %modules, "install requested");
        Ok(session_id)
    }

    fn short_circuit(&self, names: &BTreeSet<ModuleName>) -> Option<SessionId> {
        let (session, ready) = {
            let mut state = self.lock_state();
            if !state.installed.contains_all(names) {
                return None;
            }

            state.next_synthetic += 1;
            let id = SessionId::Synthetic(state.next_synthetic);
            let session = InstallSession::installed(id, names.clone());
            state.sessions.insert_if_absent(session.clone());
            state.sessions.mark_installed_applied(id);
            let ready = self.ready_signal(&mut state, &session);
            (session, ready)
        };

        info!(
            session = %session.session_id,
            modules = %session.modules_label(),
            "already installed, backend not contacted"
        );
        self.publish(&session, ready.as_ref());
        Some(session.session_id)
    }

    /// Queue a background install; completion is only visible in the installed set
    ///
    /// Returns the modules actually forwarded (already installed ones are skipped).
    pub fn request_deferred_install(&self, names: &BTreeSet<ModuleName>) -> BTreeSet<ModuleName> {
        let missing: BTreeSet<ModuleName> = {
            let state = self.lock_state();
            names
                .iter()
                .filter(|name| !state.installed.contains(name))
                .cloned()
                .collect()
        };

        if missing.is_empty() {
            debug!(modules = %display_modules(names), "deferred install: nothing to do");
            return missing;
        }
        info!(modules = %display_modules(&missing), "deferred install requested");
        self.backend.deferred_install(&missing);
        missing
    }

    /// Queue a background uninstall; absent modules are a benign no-op
    ///
    /// Returns the modules actually forwarded.
    pub fn request_deferred_uninstall(
        &self,
        names: &BTreeSet<ModuleName>,
    ) -> BTreeSet<ModuleName> {
        let present: BTreeSet<ModuleName> = {
            let state = self.lock_state();
            names
                .iter()
                .filter(|name| state.installed.contains(name))
                .cloned()
                .collect()
        };

        if present.is_empty() {
            debug!(modules = %display_modules(names), "deferred uninstall: nothing installed");
            return present;
        }
        info!(modules = %display_modules(&present), "deferred uninstall requested");
        self.backend.deferred_uninstall(&present);
        present
    }

    /// Queue a background uninstall of every installed module
    pub fn request_uninstall_all(&self) -> BTreeSet<ModuleName> {
        let installed = self.installed_modules();
        self.request_deferred_uninstall(&installed)
    }

    /// Forward the user's answer to a confirmation request
    pub fn resolve_confirmation(
        &self,
        handle: &ResolutionHandle,
        decision: Confirmation,
    ) -> Result<()> {
        info!(handle = %handle, ?decision, "confirmation answered");
        self.backend.resolve_confirmation(handle, decision)
    }

    /// Register a listener for session events
    ///
    /// The coordinator keeps only a weak reference. Listeners must return
    /// promptly: delivery is synchronous and a blocked listener stalls later
    /// updates for the same session.
    pub fn subscribe<L>(&self, listener: &Arc<L>) -> ListenerId
    where
        L: SessionListener + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove a listener; safe to call from inside its own callback
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Entry point for backend status changes
    ///
    /// Writes the update through, applies one-shot side effects, then
    /// delivers it to every listener. Updates that break the lifecycle graph
    /// are refused and not delivered. A repeated terminal status is accepted
    /// and written through, but listeners hear nothing more about the session.
    pub fn on_backend_update(&self, session: InstallSession) -> Result<()> {
        session.validate()?;

        let id = session.session_id;
        let gate = self.gate(id);
        let result = {
            let _serialized = gate.lock().unwrap_or_else(PoisonError::into_inner);
            self.apply_update(session)
        };
        self.release_gate(id, &gate);
        result
    }

    fn apply_update(&self, session: InstallSession) -> Result<()> {
        let ready = {
            let mut state = self.lock_state();
            let applied = state.sessions.apply(session.clone()).inspect_err(|e| {
                warn!(session = %session.session_id, error = %e, "backend update refused");
            })?;

            if applied.duplicate_terminal {
                debug!(session = %session.session_id, status = %session.status, "duplicate terminal update");
                return Ok(());
            }

            match session.status {
                SessionStatus::Installed => {
                    if state.sessions.mark_installed_applied(session.session_id) {
                        let added = state.installed.insert_all(&session.module_names);
                        info!(
                            session = %session.session_id,
                            added = %display_modules(&added),
                            "modules installed"
                        );
                    }
                }
                SessionStatus::RequiresUserConfirmation => {
                    info!(session = %session.session_id, "session awaits user confirmation");
                }
                SessionStatus::Failed => {
                    warn!(
                        session = %session.session_id,
                        code = ?session.error_code,
                        "install failed"
                    );
                }
                _ => {}
            }

            self.ready_signal(&mut state, &session)
        };

        self.publish(&session, ready.as_ref());
        Ok(())
    }

    /// Apply a completed deferred install to the installed set
    pub fn on_deferred_installed(&self, names: &BTreeSet<ModuleName>) {
        let added = self.lock_state().installed.insert_all(names);
        info!(added = %display_modules(&added), "deferred install completed");
    }

    /// Apply a completed deferred uninstall to the installed set
    pub fn on_deferred_uninstalled(&self, names: &BTreeSet<ModuleName>) {
        let removed = self.lock_state().installed.remove_all(names);
        info!(removed = %display_modules(&removed), "deferred uninstall completed");
    }

    /// Current state of a session
    pub fn session(&self, id: SessionId) -> Option<InstallSession> {
        self.lock_state().sessions.get(id).cloned()
    }

    /// Every known session, ordered by id
    pub fn sessions(&self) -> Vec<InstallSession> {
        self.lock_state().sessions.sessions()
    }

    pub fn installed_modules(&self) -> BTreeSet<ModuleName> {
        self.lock_state().installed.to_set()
    }

    pub fn is_installed(&self, name: &ModuleName) -> bool {
        self.lock_state().installed.contains(name)
    }

    pub fn launcher_table(&self) -> &LauncherTable {
        &self.launcher
    }

    /// Look up the configured entry point of a module
    pub fn resolve(&self, name: &ModuleName) -> Result<EntryPoint> {
        self.launcher.resolve(name).cloned()
    }

    /// Launch an installed module through `presenter`
    pub fn launch<P: Presenter + ?Sized>(
        &self,
        name: &ModuleName,
        presenter: &mut P,
    ) -> Result<EntryPoint> {
        let installed = self.lock_state().installed.clone();
        Launcher::new(&self.launcher, &installed).launch(name, presenter)
    }

    fn ready_signal(
        &self,
        state: &mut DeliveryState,
        session: &InstallSession,
    ) -> Option<ReadyToLaunch> {
        let ready = session.status == SessionStatus::Installed
            && self.launcher.covers(&session.module_names)
            && state.sessions.mark_ready_signaled(session.session_id);

        ready.then(|| ReadyToLaunch {
            session_id: session.session_id,
            module_names: session.module_names.clone(),
        })
    }

    fn publish(&self, session: &InstallSession, ready: Option<&ReadyToLaunch>) {
        let listeners = self.listeners.snapshot();
        listeners.deliver(|l| l.on_session_changed(session));
        if let Some(ready) = ready {
            debug!(session = %ready.session_id, "ready to launch");
            listeners.deliver(|l| l.on_ready_to_launch(ready));
        }
    }

    fn gate(&self, id: SessionId) -> Arc<Mutex<()>> {
        let mut gates = self.lock_gates();
        Arc::clone(gates.entry(id).or_default())
    }

    /// Drop the gate of a session that is over, or that was never recorded
    fn release_gate(&self, id: SessionId, gate: &Arc<Mutex<()>>) {
        let finished = self
            .lock_state()
            .sessions
            .get(id)
            .is_none_or(|session| session.status.is_terminal());
        if !finished {
            return;
        }

        let mut gates = self.lock_gates();
        if gates.get(&id).is_some_and(|current| Arc::ptr_eq(current, gate)) {
            gates.remove(&id);
        }
    }

    fn lock_gates(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<Mutex<()>>>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, DeliveryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UpdateSink for DeliveryCoordinator {
    fn session_updated(&self, session: InstallSession) -> Result<()> {
        self.on_backend_update(session)
    }

    fn deferred_installed(&self, names: &BTreeSet<ModuleName>) {
        self.on_deferred_installed(names);
    }

    fn deferred_uninstalled(&self, names: &BTreeSet<ModuleName>) {
        self.on_deferred_uninstalled(names);
    }
}
