//! Session state owned by the coordinator

pub mod installed;
pub mod store;

pub use installed::InstalledSet;
pub use store::{AppliedUpdate, SessionStore};
