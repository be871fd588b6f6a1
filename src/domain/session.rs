//! Install session domain types
//!
//! An [`InstallSession`] is one in-flight or completed install operation.
//! Its [`SessionStatus`] moves along a fixed lifecycle graph:
//!
//! ```text
//! Pending ──► Downloading ──► Installing ──► Installed
//!   │   │        │   ▲            │
//!   │   │        ▼   │            └──► Failed
//!   │   └──► RequiresUserConfirmation ──► Canceled
//!   └──────────► Installing / Failed
//! ```
//!
//! `Installed`, `Failed` and `Canceled` are terminal.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::module_name::{ModuleName, display_modules};
use crate::error::{Result, invalid_session};

/// Identifier of an install session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionId {
    /// Assigned by the installer backend on acceptance
    Assigned(u64),
    /// Allocated by the coordinator for an already-installed short-circuit
    Synthetic(u64),
}

impl SessionId {
    pub fn is_synthetic(self) -> bool {
        matches!(self, SessionId::Synthetic(_))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Assigned(id) => write!(f, "#{id}"),
            SessionId::Synthetic(id) => write!(f, "local-{id}"),
        }
    }
}

/// Opaque token the caller hands back to resolve a confirmation request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionHandle(String);

impl ResolutionHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The user's answer to a confirmation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

/// Lifecycle status of an install session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Downloading,
    RequiresUserConfirmation,
    Installing,
    Installed,
    Failed,
    Canceled,
}

impl SessionStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Installed | SessionStatus::Failed | SessionStatus::Canceled
        )
    }

    /// Whether `next` is an edge of the lifecycle graph.
    ///
    /// `Pending` and `Downloading` may repeat (acceptance echo and progress
    /// updates). A repeated terminal status is not an edge; see
    /// [`SessionStatus::is_duplicate_terminal`].
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::{
            Canceled, Downloading, Failed, Installed, Installing, Pending,
            RequiresUserConfirmation,
        };

        match self {
            Pending => matches!(
                next,
                Pending | Downloading | Installing | RequiresUserConfirmation | Failed
            ),
            Downloading => matches!(
                next,
                Downloading | Installing | RequiresUserConfirmation | Failed
            ),
            RequiresUserConfirmation => matches!(next, Downloading | Failed | Canceled),
            Installing => matches!(next, Installed | Failed),
            Installed | Failed | Canceled => false,
        }
    }

    /// Whether `next` repeats an already reached terminal status
    pub fn is_duplicate_terminal(self, next: SessionStatus) -> bool {
        self.is_terminal() && self == next
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Downloading => "downloading",
            SessionStatus::RequiresUserConfirmation => "requires user confirmation",
            SessionStatus::Installing => "installing",
            SessionStatus::Installed => "installed",
            SessionStatus::Failed => "failed",
            SessionStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One in-flight or completed install operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSession {
    pub session_id: SessionId,
    pub module_names: BTreeSet<ModuleName>,
    pub status: SessionStatus,
    pub bytes_downloaded: u64,
    pub total_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_handle: Option<ResolutionHandle>,
}

impl InstallSession {
    /// Create a session in the `Pending` state
    pub fn pending(session_id: SessionId, module_names: BTreeSet<ModuleName>) -> Self {
        Self {
            session_id,
            module_names,
            status: SessionStatus::Pending,
            bytes_downloaded: 0,
            total_bytes: 0,
            error_code: None,
            resolution_handle: None,
        }
    }

    /// Create an already completed session
    pub fn installed(session_id: SessionId, module_names: BTreeSet<ModuleName>) -> Self {
        Self {
            status: SessionStatus::Installed,
            ..Self::pending(session_id, module_names)
        }
    }

    /// Copy of this session moved to `Downloading` with the given progress
    #[must_use]
    pub fn downloading(&self, bytes_downloaded: u64, total_bytes: u64) -> Self {
        Self {
            status: SessionStatus::Downloading,
            bytes_downloaded,
            total_bytes,
            error_code: None,
            resolution_handle: None,
            ..self.clone()
        }
    }

    /// Copy of this session waiting for the user to confirm
    #[must_use]
    pub fn requires_confirmation(&self, handle: ResolutionHandle) -> Self {
        Self {
            status: SessionStatus::RequiresUserConfirmation,
            error_code: None,
            resolution_handle: Some(handle),
            ..self.clone()
        }
    }

    /// Copy of this session failed with `code`
    #[must_use]
    pub fn failed(&self, code: i32) -> Self {
        Self {
            status: SessionStatus::Failed,
            error_code: Some(code),
            resolution_handle: None,
            ..self.clone()
        }
    }

    /// Copy of this session in a status that carries no extra payload
    #[must_use]
    pub fn with_status(&self, status: SessionStatus) -> Self {
        Self {
            status,
            error_code: None,
            resolution_handle: None,
            ..self.clone()
        }
    }

    /// Module names joined for display
    pub fn modules_label(&self) -> String {
        display_modules(&self.module_names)
    }

    /// Check the field invariants that hold for every status
    pub fn validate(&self) -> Result<()> {
        let session = self.session_id.to_string();

        if self.module_names.is_empty() {
            return Err(invalid_session(session, "a session needs at least one module"));
        }
        if self.total_bytes > 0 && self.bytes_downloaded > self.total_bytes {
            return Err(invalid_session(
                session,
                format!(
                    "downloaded {} bytes of {}",
                    self.bytes_downloaded, self.total_bytes
                ),
            ));
        }
        if self.error_code.is_some() != (self.status == SessionStatus::Failed) {
            return Err(invalid_session(
                session,
                "an error code is present exactly when the session failed",
            ));
        }
        if self.resolution_handle.is_some()
            != (self.status == SessionStatus::RequiresUserConfirmation)
        {
            return Err(invalid_session(
                session,
                "a resolution handle is present exactly when confirmation is required",
            ));
        }
        Ok(())
    }
}
