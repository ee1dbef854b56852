//! Persistence contracts, in-memory stores, and per-key locking.

pub mod lock;
pub mod memory;
pub mod repository;

pub use lock::KeyedLock;
pub use memory::{MemoryAccountRepository, MemorySessionRepository};
pub use repository::{AccountRepository, SessionRepository};
