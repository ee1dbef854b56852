//! Session lifecycle: creation, validation, refresh, and expiry sweep.

pub mod cleanup;
pub mod manager;

pub use cleanup::SessionCleanup;
pub use manager::{IssuedSession, SessionManager, SessionOptions};
