//! Device state file errors

use super::DeliveryError;

/// Creates a state read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> DeliveryError {
    DeliveryError::StateReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a state write failed error
pub fn write_failed(path: impl Into<String>, reason: impl Into<String>) -> DeliveryError {
    DeliveryError::StateWriteFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
