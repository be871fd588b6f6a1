//! Common test utilities for ondemand integration tests

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Mutex;

use assert_cmd::Command;
use tempfile::TempDir;

use ondemand::domain::{InstallSession, ModuleName, SessionStatus};
use ondemand::events::{ReadyToLaunch, SessionListener};

/// Test configuration: fast downloads, one module that needs confirmation
/// and one that always fails
pub const TEST_CONFIG: &str = r#"
confirmation_threshold: 5000
chunk_bytes: 400
step_delay_ms: 0
modules:
  - name: image_feature
    size: 1000
    entry: image::ImageViewer
  - name: image_large_feature
    size: 6000
    entry: image::LargeImageViewer
  - name: broken_feature
    size: 500
    entry: broken::Viewer
    fail: -6
  - name: headless_feature
    size: 100
"#;

/// A scratch device for integration tests
pub struct TestDevice {
    pub temp: TempDir,
    /// Working directory of spawned commands
    pub path: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
}

impl TestDevice {
    /// Create a device configured with [`TEST_CONFIG`]
    pub fn new() -> Self {
        Self::with_config(TEST_CONFIG)
    }

    pub fn with_config(config: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        let state_dir = path.join("state");
        let config_path = path.join("ondemand.yaml");
        std::fs::write(&config_path, config).expect("Failed to write config");
        Self {
            temp,
            path,
            state_dir,
            config_path,
        }
    }

    /// The ondemand binary pointed at this device
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ondemand").expect("ondemand binary");
        cmd.current_dir(&self.path);
        cmd.env("ONDEMAND_STATE_DIR", &self.state_dir);
        cmd.env("ONDEMAND_CONFIG", &self.config_path);
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Raw device state as written by the simulated backend
    pub fn device_json(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.state_dir.join("device.json"))
            .expect("Failed to read device state");
        serde_json::from_str(&raw).expect("Invalid device state")
    }
}

impl Default for TestDevice {
    fn default() -> Self {
        Self::new()
    }
}

pub fn name(s: &str) -> ModuleName {
    ModuleName::unchecked(s)
}

pub fn names(list: &[&str]) -> BTreeSet<ModuleName> {
    list.iter().map(|s| name(s)).collect()
}

/// One observed coordinator event
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Changed(InstallSession),
    Ready(ReadyToLaunch),
}

/// Listener that records every event it receives
#[derive(Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<Seen>>,
}

impl RecordingListener {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Statuses of session changes in delivery order
    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.seen()
            .into_iter()
            .filter_map(|event| match event {
                Seen::Changed(session) => Some(session.status),
                Seen::Ready(_) => None,
            })
            .collect()
    }

    pub fn ready_count(&self) -> usize {
        self.seen()
            .iter()
            .filter(|event| matches!(event, Seen::Ready(_)))
            .count()
    }

    /// Last session event, if any
    pub fn last_session(&self) -> Option<InstallSession> {
        self.seen().into_iter().rev().find_map(|event| match event {
            Seen::Changed(session) => Some(session),
            Seen::Ready(_) => None,
        })
    }
}

impl SessionListener for RecordingListener {
    fn on_session_changed(&self, session: &InstallSession) {
        self.seen
            .lock()
            .unwrap()
            .push(Seen::Changed(session.clone()));
    }

    fn on_ready_to_launch(&self, ready: &ReadyToLaunch) {
        self.seen.lock().unwrap().push(Seen::Ready(ready.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_creation() {
        let device = TestDevice::new();
        assert!(device.config_path.exists());
        assert!(!device.state_dir.exists());
    }
}
