//! Module name errors

use super::DeliveryError;

/// Creates an invalid module name error
pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> DeliveryError {
    DeliveryError::InvalidModuleName {
        name: name.into(),
        reason: reason.into(),
    }
}
