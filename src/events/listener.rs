//! Listener capability and event payloads

use std::collections::BTreeSet;

use crate::domain::{InstallSession, ModuleName, SessionId};

/// Signal that an installed session can be launched
///
/// Emitted at most once per session id, after the session's `Installed`
/// event, and only when every module has a launcher entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyToLaunch {
    pub session_id: SessionId,
    pub module_names: BTreeSet<ModuleName>,
}

/// Observer of coordinator events
///
/// Callbacks run synchronously on the thread that produced the update, one
/// listener after another. A listener must return promptly: a listener that
/// blocks stalls delivery of later updates for the same session.
pub trait SessionListener: Send + Sync {
    fn on_session_changed(&self, session: &InstallSession);

    fn on_ready_to_launch(&self, _ready: &ReadyToLaunch) {}
}
