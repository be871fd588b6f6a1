//! Delivery configuration (ondemand.yaml) data structures

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::SimulationSettings;
use crate::backend::simulated::{DEFAULT_CHUNK_BYTES, DEFAULT_CONFIRMATION_THRESHOLD};
use crate::domain::ModuleName;
use crate::error::{
    Result, config_invalid, config_not_found, config_parse_failed, config_read_failed,
};
use crate::launcher::{EntryPoint, LauncherTable};

/// Default pause between simulated download steps
pub const DEFAULT_STEP_DELAY_MS: u64 = 40;

/// Configuration from ondemand.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Downloads of at least this many bytes need user confirmation
    #[serde(default = "default_confirmation_threshold")]
    pub confirmation_threshold: u64,

    /// Simulated download step in bytes
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: u64,

    /// Pause between download steps
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Deliverable modules
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

/// One deliverable module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: ModuleName,

    /// Download size in bytes
    pub size: u64,

    /// Entry point opened once installed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryPoint>,

    /// Error code the simulated install fails with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<i32>,
}

fn default_confirmation_threshold() -> u64 {
    DEFAULT_CONFIRMATION_THRESHOLD
}

fn default_chunk_bytes() -> u64 {
    DEFAULT_CHUNK_BYTES
}

fn default_step_delay_ms() -> u64 {
    DEFAULT_STEP_DELAY_MS
}

impl ModuleConfig {
    pub fn new(name: &str, size: u64, entry: &str) -> Self {
        Self {
            name: ModuleName::unchecked(name),
            size,
            entry: Some(EntryPoint::new(entry)),
            fail: None,
        }
    }
}

impl Default for DeliveryConfig {
    /// The two image viewer modules shipped with the sample app
    fn default() -> Self {
        Self {
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            modules: vec![
                ModuleConfig::new("image_feature", 2 * 1024 * 1024, "image::ImageViewer"),
                ModuleConfig::new(
                    "image_large_feature",
                    6 * 1024 * 1024,
                    "image::LargeImageViewer",
                ),
            ],
        }
    }
}

impl DeliveryConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        if !path.is_file() {
            return Err(config_not_found(display));
        }

        let content =
            fs::read_to_string(path).map_err(|e| config_read_failed(&display, e.to_string()))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| config_parse_failed(&display, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_bytes == 0 {
            return Err(config_invalid("chunk_bytes must be greater than zero"));
        }

        let mut seen = BTreeSet::new();
        for module in &self.modules {
            if module.name.is_empty() || module.name.as_str().chars().any(char::is_whitespace) {
                return Err(config_invalid(format!(
                    "invalid module name '{}'",
                    module.name
                )));
            }
            if !seen.insert(&module.name) {
                return Err(config_invalid(format!(
                    "module '{}' is listed more than once",
                    module.name
                )));
            }
            if module.fail == Some(0) {
                return Err(config_invalid(format!(
                    "module '{}': failure code 0 means success",
                    module.name
                )));
            }
        }
        Ok(())
    }

    /// Names of every configured module
    pub fn module_names(&self) -> BTreeSet<ModuleName> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }

    pub fn module(&self, name: &ModuleName) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| &m.name == name)
    }

    /// Behaviour of the simulated device
    pub fn simulation(&self) -> SimulationSettings {
        SimulationSettings {
            catalog: self
                .modules
                .iter()
                .map(|m| (m.name.clone(), m.size))
                .collect(),
            confirmation_threshold: self.confirmation_threshold,
            chunk_bytes: self.chunk_bytes,
            step_delay: Duration::from_millis(self.step_delay_ms),
            failures: self
                .modules
                .iter()
                .filter_map(|m| m.fail.map(|code| (m.name.clone(), code)))
                .collect(),
        }
    }

    /// Launcher entries of modules that declare one
    pub fn launcher_table(&self) -> LauncherTable {
        self.modules
            .iter()
            .filter_map(|m| m.entry.clone().map(|entry| (m.name.clone(), entry)))
            .collect()
    }
}
