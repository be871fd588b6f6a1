//! Launcher errors

use super::DeliveryError;

/// Creates a module not installed error
pub fn not_installed(name: impl Into<String>) -> DeliveryError {
    DeliveryError::NotInstalled { name: name.into() }
}

/// Creates an entry point not found error
pub fn not_found(name: impl Into<String>) -> DeliveryError {
    DeliveryError::EntryPointNotFound { name: name.into() }
}
