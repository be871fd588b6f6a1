//! Shared setup for commands that talk to the device

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::backend::SimulatedBackend;
use crate::config::{self, DeliveryConfig};
use crate::coordinator::DeliveryCoordinator;
use crate::domain::{ModuleName, parse_module_set};
use crate::error::{Result, request_rejected};

/// Configuration, simulated device and coordinator for one invocation
pub struct Context {
    pub config: DeliveryConfig,
    pub backend: Arc<SimulatedBackend>,
    pub coordinator: Arc<DeliveryCoordinator>,
}

impl Context {
    /// Load configuration and open the device state
    pub fn open(config_path: Option<&Path>, state_dir: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = config::load_config(config_path, &cwd)?;
        let state_dir = config::state_dir(state_dir)?;
        debug!(state_dir = %state_dir.display(), "opening device");

        let backend = Arc::new(SimulatedBackend::open(config.simulation(), &state_dir)?);
        let coordinator = DeliveryCoordinator::new(backend.clone(), config.launcher_table());

        Ok(Self {
            config,
            backend,
            coordinator,
        })
    }

    /// Parse names given on the command line, or fall back to `default`
    pub fn modules_or(
        &self,
        names: &[String],
        default: impl FnOnce() -> BTreeSet<ModuleName>,
    ) -> Result<BTreeSet<ModuleName>> {
        if names.is_empty() {
            Ok(default())
        } else {
            parse_module_set(names)
        }
    }

    /// Fail on names missing from the configured catalog
    pub fn require_known(&self, names: &BTreeSet<ModuleName>) -> Result<()> {
        match names.iter().find(|name| self.config.module(name).is_none()) {
            Some(unknown) => Err(request_rejected(
                unknown.as_str(),
                format!("unknown module '{unknown}'"),
            )),
            None => Ok(()),
        }
    }

    /// Total configured download size of `names`
    pub fn download_size(&self, names: &BTreeSet<ModuleName>) -> u64 {
        names
            .iter()
            .filter_map(|name| self.config.module(name))
            .map(|module| module.size)
            .sum()
    }
}
