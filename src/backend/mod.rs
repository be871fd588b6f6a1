//! Installer backend interface
//!
//! The backend performs the actual download, install and uninstall work. The
//! coordinator only talks to it through [`InstallerBackend`] and receives its
//! asynchronous updates through a [`BackendNotifier`] handed over in
//! [`InstallerBackend::attach`].

pub mod simulated;
pub mod state;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Weak;

use tracing::warn;

use crate::domain::{Confirmation, InstallSession, ModuleName, ResolutionHandle, SessionId};
use crate::error::Result;

pub use simulated::{SimulatedBackend, SimulationSettings};

/// Synchronous refusal of an install request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{cause}")]
pub struct RequestRejected {
    pub cause: String,
}

impl RequestRejected {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// External collaborator that installs and uninstalls modules
pub trait InstallerBackend: Send + Sync {
    /// Receive the notifier used to push updates; called once by the coordinator
    fn attach(&self, notifier: BackendNotifier);

    /// Modules installed when the coordinator starts
    fn installed_modules(&self) -> BTreeSet<ModuleName>;

    /// Start an install session, returning its id on acceptance
    fn start_install(
        &self,
        names: &BTreeSet<ModuleName>,
    ) -> std::result::Result<SessionId, RequestRejected>;

    /// Queue a background install with no completion guarantee
    fn deferred_install(&self, names: &BTreeSet<ModuleName>);

    /// Queue a background uninstall with no completion guarantee
    fn deferred_uninstall(&self, names: &BTreeSet<ModuleName>);

    /// Answer a confirmation request on behalf of the user
    fn resolve_confirmation(&self, handle: &ResolutionHandle, decision: Confirmation)
    -> Result<()>;
}

/// Receiver side of backend notifications, implemented by the coordinator
pub trait UpdateSink: Send + Sync {
    fn session_updated(&self, session: InstallSession) -> Result<()>;

    fn deferred_installed(&self, names: &BTreeSet<ModuleName>);

    fn deferred_uninstalled(&self, names: &BTreeSet<ModuleName>);
}

/// Handle a backend uses to push updates to the coordinator
///
/// Holds a weak reference: notifications sent after the coordinator is gone
/// are dropped.
#[derive(Clone)]
pub struct BackendNotifier {
    sink: Weak<dyn UpdateSink>,
}

impl BackendNotifier {
    pub fn new(sink: Weak<dyn UpdateSink>) -> Self {
        Self { sink }
    }

    /// Report a session status change
    pub fn session_updated(&self, session: InstallSession) -> Result<()> {
        match self.sink.upgrade() {
            Some(sink) => sink.session_updated(session),
            None => {
                warn!(session = %session.session_id, "coordinator gone, update dropped");
                Ok(())
            }
        }
    }

    /// Report completion of a deferred install
    pub fn deferred_installed(&self, names: &BTreeSet<ModuleName>) {
        if let Some(sink) = self.sink.upgrade() {
            sink.deferred_installed(names);
        }
    }

    /// Report completion of a deferred uninstall
    pub fn deferred_uninstalled(&self, names: &BTreeSet<ModuleName>) {
        if let Some(sink) = self.sink.upgrade() {
            sink.deferred_uninstalled(names);
        }
    }
}

impl fmt::Debug for BackendNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendNotifier")
            .field("connected", &(self.sink.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejected_is_an_error() {
        let rejected = RequestRejected::new("unknown module 'video_feature'");
        let err: &dyn std::error::Error = &rejected;
        assert_eq!(err.to_string(), "unknown module 'video_feature'");
        assert!(err.source().is_none());
    }
}
