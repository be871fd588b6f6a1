//! Session lifecycle errors

use super::DeliveryError;

/// Creates an invalid transition error
pub fn invalid_transition(
    session: impl Into<String>,
    from: impl Into<String>,
    to: impl Into<String>,
) -> DeliveryError {
    DeliveryError::InvalidTransition {
        session: session.into(),
        from: from.into(),
        to: to.into(),
    }
}

/// Creates an invalid session error
pub fn invalid(session: impl Into<String>, message: impl Into<String>) -> DeliveryError {
    DeliveryError::InvalidSession {
        session: session.into(),
        message: message.into(),
    }
}

/// Creates a session failed error
pub fn failed(modules: impl Into<String>, code: i32) -> DeliveryError {
    DeliveryError::SessionFailed {
        modules: modules.into(),
        code,
    }
}

/// Creates a session canceled error
pub fn canceled(modules: impl Into<String>) -> DeliveryError {
    DeliveryError::SessionCanceled {
        modules: modules.into(),
    }
}

/// Creates an unknown confirmation error
pub fn unknown_confirmation(handle: impl Into<String>) -> DeliveryError {
    DeliveryError::UnknownConfirmation {
        handle: handle.into(),
    }
}

/// Creates a stalled session error
pub fn stalled(session: impl Into<String>) -> DeliveryError {
    DeliveryError::SessionStalled {
        session: session.into(),
    }
}
