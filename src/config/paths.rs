//! Locating the configuration file and the state directory

use std::path::{Path, PathBuf};

use tracing::debug;

use super::DeliveryConfig;
use crate::error::{DeliveryError, Result};

/// Configuration file looked up in the current directory
pub const CONFIG_FILE: &str = "ondemand.yaml";

/// Load the configuration in priority order
///
/// 1. `explicit` (from `--config` or `ONDEMAND_CONFIG`), which must exist
/// 2. `ondemand.yaml` in `cwd`
/// 3. the built-in default
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<DeliveryConfig> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading configuration");
        return DeliveryConfig::load(path);
    }

    let local = cwd.join(CONFIG_FILE);
    if local.is_file() {
        debug!(path = %local.display(), "loading configuration");
        return DeliveryConfig::load(&local);
    }

    debug!("no configuration file, using built-in modules");
    Ok(DeliveryConfig::default())
}

/// Directory holding the simulated device state
///
/// `explicit` comes from `--state-dir` or `ONDEMAND_STATE_DIR`; otherwise
/// the platform data directory is used.
pub fn state_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => dirs::data_dir()
            .map(|dir| dir.join("ondemand"))
            .ok_or(DeliveryError::StateDirUnavailable),
    }
}
