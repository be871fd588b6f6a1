//! Error types and handling for ondemand
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`module`]: Module name errors
//! - [`request`]: Install request errors
//! - [`session`]: Session lifecycle errors
//! - [`launcher`]: Launcher errors
//! - [`config`]: Configuration errors
//! - [`state`]: Device state file errors

pub mod config;
pub mod launcher;
pub mod module;
pub mod request;
pub mod session;
pub mod state;

pub use config::{
    invalid as config_invalid, not_found as config_not_found, parse_failed as config_parse_failed,
    read_failed as config_read_failed,
};
pub use launcher::{not_found as entry_point_not_found, not_installed};
pub use module::invalid_name as invalid_module_name;
pub use request::rejected as request_rejected;
pub use session::{
    canceled as session_canceled, failed as session_failed, invalid as invalid_session,
    invalid_transition, stalled as session_stalled, unknown_confirmation,
};
pub use state::{read_failed as state_read_failed, write_failed as state_write_failed};

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for ondemand operations
#[derive(Error, Diagnostic, Debug)]
pub enum DeliveryError {
    // Module errors
    #[error("Invalid module name '{name}': {reason}")]
    #[diagnostic(
        code(ondemand::module::invalid_name),
        help("Module names are non-empty, case-sensitive identifiers such as image_feature")
    )]
    InvalidModuleName { name: String, reason: String },

    // Request errors
    #[error("Install request for {modules} was rejected: {cause}")]
    #[diagnostic(
        code(ondemand::request::rejected),
        help("Check that every module name exists in the module catalog")
    )]
    RequestRejected { modules: String, cause: String },

    // Session errors
    #[error("Session {session} cannot move from {from} to {to}")]
    #[diagnostic(code(ondemand::session::invalid_transition))]
    InvalidTransition {
        session: String,
        from: String,
        to: String,
    },

    #[error("Invalid session {session}: {message}")]
    #[diagnostic(code(ondemand::session::invalid))]
    InvalidSession { session: String, message: String },

    #[error("Installation of {modules} failed with error code {code}")]
    #[diagnostic(
        code(ondemand::session::failed),
        help("Retry the install; the coordinator never retries on its own")
    )]
    SessionFailed { modules: String, code: i32 },

    #[error("Installation of {modules} was canceled")]
    #[diagnostic(code(ondemand::session::canceled))]
    SessionCanceled { modules: String },

    #[error("No pending confirmation for handle '{handle}'")]
    #[diagnostic(
        code(ondemand::session::unknown_confirmation),
        help("The session may already have been confirmed, declined or failed")
    )]
    UnknownConfirmation { handle: String },

    #[error("Session {session} stopped reporting progress")]
    #[diagnostic(
        code(ondemand::session::stalled),
        help("Run with -v to see which update the coordinator refused")
    )]
    SessionStalled { session: String },

    // Launcher errors
    #[error("Module '{name}' is not installed")]
    #[diagnostic(
        code(ondemand::launcher::not_installed),
        help("Run 'ondemand install {name}' to install it first")
    )]
    NotInstalled { name: String },

    #[error("No entry point configured for module '{name}'")]
    #[diagnostic(
        code(ondemand::launcher::not_found),
        help("Add an 'entry' for this module to the configuration file")
    )]
    EntryPointNotFound { name: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(ondemand::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(ondemand::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(ondemand::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(ondemand::config::invalid))]
    ConfigInvalid { message: String },

    // Device state errors
    #[error("Could not determine a state directory")]
    #[diagnostic(
        code(ondemand::state::no_dir),
        help("Pass --state-dir or set ONDEMAND_STATE_DIR")
    )]
    StateDirUnavailable,

    #[error("Failed to read device state: {path}: {reason}")]
    #[diagnostic(code(ondemand::state::read_failed))]
    StateReadFailed { path: String, reason: String },

    #[error("Failed to write device state: {path}: {reason}")]
    #[diagnostic(code(ondemand::state::write_failed))]
    StateWriteFailed { path: String, reason: String },

    // Terminal errors
    #[error("Failed to read confirmation: {message}")]
    #[diagnostic(code(ondemand::prompt::failed))]
    PromptFailed { message: String },

    #[error("Unsupported shell: {shell}")]
    #[diagnostic(
        code(ondemand::completions::unsupported_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnsupportedShell { shell: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(ondemand::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        DeliveryError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for DeliveryError {
    fn from(err: serde_yaml::Error) -> Self {
        DeliveryError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(err: serde_json::Error) -> Self {
        DeliveryError::StateReadFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for DeliveryError {
    fn from(err: inquire::InquireError) -> Self {
        DeliveryError::PromptFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_error_contains {
        ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
            #[test]
            fn $test_name() {
                let err = $err;
                let error_string = err.to_string();
                $(
                    assert!(error_string.contains($contains),
                        "Error message should contain '{}', got: {}",
                        $contains,
                        error_string
                    );
                )+
            }
        };
    }

    #[test]
    fn test_error_display() {
        let err = not_installed("image_feature");
        assert_eq!(err.to_string(), "Module 'image_feature' is not installed");
    }

    #[test]
    fn test_error_code() {
        let err = entry_point_not_found("image_feature");
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("ondemand::launcher::not_found".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DeliveryError = io_err.into();
        assert!(matches!(err, DeliveryError::IoError { .. }));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let parse_result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content: [unclosed");
        let err: DeliveryError = parse_result.unwrap_err().into();
        assert!(matches!(err, DeliveryError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid json content");
        let err: DeliveryError = parse_result.unwrap_err().into();
        assert!(matches!(err, DeliveryError::StateReadFailed { .. }));
    }

    test_error_contains!(
        test_request_rejected_error,
        request_rejected("image_feature", "unknown module"),
        "image_feature",
        "unknown module"
    );

    test_error_contains!(
        test_invalid_transition_error,
        invalid_transition("#3", "Installed", "Downloading"),
        "#3",
        "Installed",
        "Downloading"
    );

    test_error_contains!(
        test_session_failed_error,
        session_failed("image_feature", -6),
        "image_feature",
        "-6"
    );

    test_error_contains!(
        test_state_dir_unavailable_error,
        DeliveryError::StateDirUnavailable,
        "state directory"
    );

    #[test]
    fn test_not_installed_help_names_module() {
        let err = not_installed("image_large_feature");
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("ondemand install image_large_feature"));
    }
}
