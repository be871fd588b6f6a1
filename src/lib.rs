//! ondemand - on-demand module delivery
//!
//! A client-side coordinator that requests modules from an installer
//! backend, tracks each install session through its lifecycle, fans status
//! changes out to listeners and launches modules once they are installed.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod events;
pub mod launcher;
pub mod progress;
pub mod session;

pub use coordinator::DeliveryCoordinator;
pub use error::{DeliveryError, Result};
