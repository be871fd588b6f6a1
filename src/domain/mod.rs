//! Domain models for ondemand
//!
//! This module contains pure domain objects: module names, session
//! identifiers and the install session lifecycle.

pub mod module_name;
pub mod session;

pub use module_name::{ModuleName, display_modules, parse_module_set};
pub use session::{Confirmation, InstallSession, ResolutionHandle, SessionId, SessionStatus};
