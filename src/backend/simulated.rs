//! Simulated installer backend
//!
//! Stands in for the platform module-install service so the coordinator can
//! be driven end to end without a real package manager:
//!
//! - requests naming unknown modules are rejected synchronously
//! - requests of at least `confirmation_threshold` bytes wait for the user
//!   to confirm before downloading
//! - each accepted session runs on its own worker thread, reporting download
//!   progress in `chunk_bytes` steps, then `Installing` and `Installed`
//! - deferred requests are only queued; [`SimulatedBackend::settle`] applies
//!   them later, the way the platform runs background work at a time of its
//!   own choosing

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::state::{DeferredRequest, DeviceState, StateFile};
use super::{BackendNotifier, InstallerBackend, RequestRejected};
use crate::domain::{
    Confirmation, InstallSession, ModuleName, ResolutionHandle, SessionId, SessionStatus,
    display_modules,
};
use crate::error::{Result, unknown_confirmation};

/// Downloads of this size or more need user confirmation by default
pub const DEFAULT_CONFIRMATION_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Default download step
pub const DEFAULT_CHUNK_BYTES: u64 = 256 * 1024;

/// Error code reported when the device state cannot be updated
pub const ERROR_INTERNAL: i32 = -100;

/// Behaviour of the simulated device
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    /// Known modules and their download sizes in bytes
    pub catalog: BTreeMap<ModuleName, u64>,
    pub confirmation_threshold: u64,
    pub chunk_bytes: u64,
    pub step_delay: Duration,
    /// Modules whose install fails after downloading, with the error code
    pub failures: BTreeMap<ModuleName, i32>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            catalog: BTreeMap::new(),
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            step_delay: Duration::ZERO,
            failures: BTreeMap::new(),
        }
    }
}

impl SimulationSettings {
    /// Builder-style catalog entry
    #[must_use]
    pub fn with_module(mut self, name: ModuleName, size: u64) -> Self {
        self.catalog.insert(name, size);
        self
    }
}

/// Modules applied by one [`SimulatedBackend::settle`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub installed: BTreeSet<ModuleName>,
    pub uninstalled: BTreeSet<ModuleName>,
}

struct Shared {
    settings: SimulationSettings,
    device: Mutex<DeviceState>,
    state_file: Option<StateFile>,
    notifier: OnceLock<BackendNotifier>,
    confirmations: Mutex<HashMap<ResolutionHandle, Sender<Confirmation>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Thread-based fake of the platform install service
pub struct SimulatedBackend {
    shared: Arc<Shared>,
}

impl SimulatedBackend {
    /// Backend whose device state lives only in memory
    pub fn in_memory(settings: SimulationSettings) -> Self {
        Self::with_state(settings, DeviceState::default(), None)
    }

    /// Backend whose device state is persisted in `state_dir`
    pub fn open(settings: SimulationSettings, state_dir: &Path) -> Result<Self> {
        let file = StateFile::in_dir(state_dir);
        let device = file.load()?;
        debug!(
            path = %file.path().display(),
            installed = device.installed.len(),
            pending = device.pending.len(),
            "opened device state"
        );
        Ok(Self::with_state(settings, device, Some(file)))
    }

    fn with_state(
        settings: SimulationSettings,
        device: DeviceState,
        state_file: Option<StateFile>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                device: Mutex::new(device),
                state_file,
                notifier: OnceLock::new(),
                confirmations: Mutex::new(HashMap::new()),
                workers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the device state
    pub fn device_state(&self) -> DeviceState {
        self.shared.lock_device().clone()
    }

    /// Apply every queued deferred request and notify the coordinator
    pub fn settle(&self) -> Result<SettleReport> {
        let mut report = SettleReport::default();
        {
            let mut device = self.shared.lock_device();
            let pending = std::mem::take(&mut device.pending);
            if pending.is_empty() {
                return Ok(report);
            }

            for request in pending {
                match request {
                    DeferredRequest::Install { modules } => {
                        for name in modules {
                            if !self.shared.settings.catalog.contains_key(&name) {
                                warn!(module = %name, "deferred install of unknown module skipped");
                                continue;
                            }
                            report.uninstalled.remove(&name);
                            if device.installed.insert(name.clone()) {
                                report.installed.insert(name);
                            }
                        }
                    }
                    DeferredRequest::Uninstall { modules } => {
                        for name in modules {
                            report.installed.remove(&name);
                            if device.installed.remove(&name) {
                                report.uninstalled.insert(name);
                            }
                        }
                    }
                }
            }
            self.shared.save(&device)?;
        }

        info!(
            installed = %display_modules(&report.installed),
            uninstalled = %display_modules(&report.uninstalled),
            "deferred requests applied"
        );

        if let Some(notifier) = self.shared.notifier.get() {
            if !report.installed.is_empty() {
                notifier.deferred_installed(&report.installed);
            }
            if !report.uninstalled.is_empty() {
                notifier.deferred_uninstalled(&report.uninstalled);
            }
        }
        Ok(report)
    }

    /// Block until every running session worker has finished
    ///
    /// Sessions waiting for confirmation keep their worker alive, so resolve
    /// them first.
    pub fn wait_idle(&self) {
        let workers: Vec<JoinHandle<()>> = {
            let mut workers = self
                .shared
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *workers)
        };

        for worker in workers {
            if worker.join().is_err() {
                warn!("install worker panicked");
            }
        }
    }

    fn validate_request(&self, names: &BTreeSet<ModuleName>) -> std::result::Result<u64, RequestRejected> {
        if names.is_empty() {
            return Err(RequestRejected::new("no modules requested"));
        }

        let mut total = 0u64;
        for name in names {
            if name.is_empty() {
                return Err(RequestRejected::new("module name cannot be empty"));
            }
            let Some(size) = self.shared.settings.catalog.get(name) else {
                return Err(RequestRejected::new(format!("unknown module '{name}'")));
            };
            total = total.saturating_add(*size);
        }
        Ok(total)
    }
}

impl InstallerBackend for SimulatedBackend {
    fn attach(&self, notifier: BackendNotifier) {
        if self.shared.notifier.set(notifier).is_err() {
            warn!("simulated backend attached twice, keeping the first coordinator");
        }
    }

    fn installed_modules(&self) -> BTreeSet<ModuleName> {
        self.shared.lock_device().installed.clone()
    }

    fn start_install(
        &self,
        names: &BTreeSet<ModuleName>,
    ) -> std::result::Result<SessionId, RequestRejected> {
        let total = self.validate_request(names)?;

        let number = {
            let mut device = self.shared.lock_device();
            device.next_session += 1;
            let number = device.next_session;
            self.shared
                .save(&device)
                .map_err(|e| RequestRejected::new(format!("device state unavailable: {e}")))?;
            number
        };
        let session_id = SessionId::Assigned(number);
        let base = InstallSession::pending(session_id, names.clone());

        let confirmation = (total >= self.shared.settings.confirmation_threshold).then(|| {
            let handle = ResolutionHandle::new(format!("confirm-{number}"));
            let (tx, rx) = mpsc::channel();
            self.shared
                .confirmations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(handle.clone(), tx);
            (handle, rx)
        });

        debug!(
            session = %session_id,
            modules = %base.modules_label(),
            total,
            needs_confirmation = confirmation.is_some(),
            "install accepted"
        );

        let shared = Arc::clone(&self.shared);
        let worker = thread::spawn(move || shared.run_session(&base, total, confirmation));
        self.shared
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(worker);

        Ok(session_id)
    }

    fn deferred_install(&self, names: &BTreeSet<ModuleName>) {
        self.shared.enqueue(DeferredRequest::Install {
            modules: names.clone(),
        });
    }

    fn deferred_uninstall(&self, names: &BTreeSet<ModuleName>) {
        self.shared.enqueue(DeferredRequest::Uninstall {
            modules: names.clone(),
        });
    }

    fn resolve_confirmation(
        &self,
        handle: &ResolutionHandle,
        decision: Confirmation,
    ) -> Result<()> {
        let sender = self
            .shared
            .confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
            .ok_or_else(|| unknown_confirmation(handle.as_str()))?;

        debug!(handle = %handle, ?decision, "confirmation resolved");
        sender
            .send(decision)
            .map_err(|_| unknown_confirmation(handle.as_str()))
    }
}

impl Shared {
    fn lock_device(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, device: &DeviceState) -> Result<()> {
        match &self.state_file {
            Some(file) => file.save(device),
            None => Ok(()),
        }
    }

    fn enqueue(&self, request: DeferredRequest) {
        let mut device = self.lock_device();
        debug!(?request, "deferred request queued");
        device.pending.push(request);
        if let Err(e) = self.save(&device) {
            warn!(error = %e, "failed to persist deferred request");
        }
    }

    /// Push an update to the coordinator; `false` stops the session
    fn emit(&self, session: InstallSession) -> bool {
        let Some(notifier) = self.notifier.get() else {
            warn!(session = %session.session_id, "no coordinator attached");
            return false;
        };
        match notifier.session_updated(session) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "coordinator refused session update");
                false
            }
        }
    }

    fn run_session(
        &self,
        base: &InstallSession,
        total: u64,
        confirmation: Option<(ResolutionHandle, Receiver<Confirmation>)>,
    ) {
        if let Some((handle, decisions)) = confirmation {
            if !self.emit(base.requires_confirmation(handle.clone())) {
                return;
            }
            let decision = decisions.recv().unwrap_or(Confirmation::Declined);
            if decision == Confirmation::Declined {
                self.emit(base.with_status(SessionStatus::Canceled));
                return;
            }
        }

        if !self.emit(base.downloading(0, total)) {
            return;
        }
        let chunk = self.settings.chunk_bytes.max(1);
        let mut downloaded = 0u64;
        while downloaded < total {
            if !self.settings.step_delay.is_zero() {
                thread::sleep(self.settings.step_delay);
            }
            downloaded = downloaded.saturating_add(chunk).min(total);
            if !self.emit(base.downloading(downloaded, total)) {
                return;
            }
        }
        let progressed = base.downloading(total, total);

        if let Some(code) = base
            .module_names
            .iter()
            .find_map(|name| self.settings.failures.get(name).copied())
        {
            self.emit(progressed.failed(code));
            return;
        }

        if !self.emit(progressed.with_status(SessionStatus::Installing)) {
            return;
        }

        let saved = {
            let mut device = self.lock_device();
            device.installed.extend(base.module_names.iter().cloned());
            self.save(&device)
        };
        match saved {
            Ok(()) => {
                self.emit(progressed.with_status(SessionStatus::Installed));
            }
            Err(e) => {
                warn!(error = %e, "could not record installed modules");
                self.emit(progressed.failed(ERROR_INTERNAL));
            }
        }
    }
}
