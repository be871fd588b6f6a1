//! Command implementations for the ondemand CLI

pub mod completions;
pub mod context;
pub mod deferred;
pub mod install;
pub mod launch;
pub mod list;
pub mod settle;
pub mod version;

pub use context::Context;
