//! Configuration handling for ondemand
//!
//! - `ondemand.yaml` - deliverable modules, their sizes and entry points,
//!   and the behaviour of the simulated device
//! - the state directory holding the simulated device state

pub mod delivery;
pub mod paths;

pub use delivery::{DeliveryConfig, ModuleConfig};
pub use paths::{CONFIG_FILE, load_config, state_dir};
