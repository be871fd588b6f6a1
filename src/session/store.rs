//! Session store
//!
//! Holds per-request session state keyed by session id and enforces the
//! lifecycle graph on every write. The store also remembers which one-shot
//! side effects were already performed for a session so duplicate terminal
//! notifications stay idempotent.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{InstallSession, SessionId, SessionStatus};
use crate::error::{Result, invalid_session, invalid_transition};

/// A stored session plus its one-shot bookkeeping
#[derive(Debug, Clone)]
struct SessionRecord {
    session: InstallSession,
    installed_applied: bool,
    ready_signaled: bool,
}

impl SessionRecord {
    fn new(session: InstallSession) -> Self {
        Self {
            session,
            installed_applied: false,
            ready_signaled: false,
        }
    }
}

/// Result of writing a backend update through the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedUpdate {
    /// Status held before the update, `None` for a session seen for the first time
    pub previous: Option<SessionStatus>,
    /// The update repeated a terminal status already reached
    pub duplicate_terminal: bool,
}

/// Per-request session state
#[derive(Debug, Default)]
pub struct SessionStore {
    records: BTreeMap<SessionId, SessionRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly accepted session unless updates for it already arrived
    ///
    /// Returns `true` when the session was inserted.
    pub fn insert_if_absent(&mut self, session: InstallSession) -> bool {
        if self.records.contains_key(&session.session_id) {
            return false;
        }
        self.records
            .insert(session.session_id, SessionRecord::new(session));
        true
    }

    /// Write an update through, enforcing the lifecycle graph
    ///
    /// A session seen for the first time is treated as leaving `Pending`, since
    /// the backend may report progress before the acceptance is recorded.
    pub fn apply(&mut self, update: InstallSession) -> Result<AppliedUpdate> {
        let id = update.session_id;

        let Some(record) = self.records.get_mut(&id) else {
            if !SessionStatus::Pending.can_transition_to(update.status) {
                return Err(invalid_transition(
                    id.to_string(),
                    SessionStatus::Pending.label(),
                    update.status.label(),
                ));
            }
            debug!(session = %id, status = %update.status, "first update for unseen session");
            self.records.insert(id, SessionRecord::new(update));
            return Ok(AppliedUpdate {
                previous: None,
                duplicate_terminal: false,
            });
        };

        if record.session.module_names != update.module_names {
            return Err(invalid_session(
                id.to_string(),
                format!(
                    "module set changed from [{}] to [{}]",
                    record.session.modules_label(),
                    update.modules_label()
                ),
            ));
        }

        let previous = record.session.status;
        let duplicate_terminal = previous.is_duplicate_terminal(update.status);
        if !duplicate_terminal && !previous.can_transition_to(update.status) {
            return Err(invalid_transition(
                id.to_string(),
                previous.label(),
                update.status.label(),
            ));
        }

        record.session = update;
        Ok(AppliedUpdate {
            previous: Some(previous),
            duplicate_terminal,
        })
    }

    pub fn get(&self, id: SessionId) -> Option<&InstallSession> {
        self.records.get(&id).map(|r| &r.session)
    }

    /// All sessions ordered by id
    pub fn sessions(&self) -> Vec<InstallSession> {
        self.records.values().map(|r| r.session.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mark the installed-set mutation as done; `true` only the first time
    pub fn mark_installed_applied(&mut self, id: SessionId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if !record.installed_applied => {
                record.installed_applied = true;
                true
            }
            _ => false,
        }
    }

    /// Mark the ready-to-launch signal as sent; `true` only the first time
    pub fn mark_ready_signaled(&mut self, id: SessionId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if !record.ready_signaled => {
                record.ready_signaled = true;
                true
            }
            _ => false,
        }
    }
}
