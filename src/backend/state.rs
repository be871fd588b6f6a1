//! Device state of the simulated backend
//!
//! Tracks which modules are installed on the simulated device and which
//! deferred requests are still queued. Persisted as JSON in the state
//! directory so separate CLI invocations see the same device.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ModuleName;
use crate::error::{Result, state_read_failed, state_write_failed};

/// File name of the device state inside the state directory
pub const STATE_FILE: &str = "device.json";

/// A queued background request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeferredRequest {
    Install { modules: BTreeSet<ModuleName> },
    Uninstall { modules: BTreeSet<ModuleName> },
}

impl DeferredRequest {
    pub fn modules(&self) -> &BTreeSet<ModuleName> {
        match self {
            DeferredRequest::Install { modules } | DeferredRequest::Uninstall { modules } => {
                modules
            }
        }
    }
}

/// Installed modules plus queued deferred work
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    #[serde(default)]
    pub installed: BTreeSet<ModuleName>,
    #[serde(default)]
    pub next_session: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<DeferredRequest>,
}

impl DeviceState {
    /// Whether a queued request mentions `name`, and which kind
    pub fn pending_for(&self, name: &ModuleName) -> Option<&DeferredRequest> {
        self.pending
            .iter()
            .rev()
            .find(|request| request.modules().contains(name))
    }
}

/// On-disk location of a [`DeviceState`]
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// State file inside `state_dir`
    pub fn in_dir(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the state, or an empty device if nothing was saved yet
    pub fn load(&self) -> Result<DeviceState> {
        if !self.path.exists() {
            return Ok(DeviceState::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| state_read_failed(self.path.display().to_string(), e.to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| state_read_failed(self.path.display().to_string(), e.to_string()))
    }

    /// Write the state atomically
    pub fn save(&self, state: &DeviceState) -> Result<()> {
        let shown = self.path.display().to_string();
        let dir = self
            .path
            .parent()
            .ok_or_else(|| state_write_failed(&shown, "state file has no parent directory"))?;

        fs::create_dir_all(dir).map_err(|e| state_write_failed(&shown, e.to_string()))?;

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| state_write_failed(&shown, e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| state_write_failed(&shown, e.to_string()))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| state_write_failed(&shown, e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| state_write_failed(&shown, e.to_string()))?;

        debug!(path = %shown, "device state saved");
        Ok(())
    }
}
