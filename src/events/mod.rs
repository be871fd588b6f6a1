//! Event delivery from the coordinator to its observers

pub mod listener;
pub mod registry;

pub use listener::{ReadyToLaunch, SessionListener};
pub use registry::{ListenerId, ListenerRegistry, Snapshot};
