//! Install request errors

use super::DeliveryError;

/// Creates a request rejected error
pub fn rejected(modules: impl Into<String>, cause: impl Into<String>) -> DeliveryError {
    DeliveryError::RequestRejected {
        modules: modules.into(),
        cause: cause.into(),
    }
}
