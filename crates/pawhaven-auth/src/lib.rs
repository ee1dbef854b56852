//! # pawhaven-auth
//!
//! Authentication and session lifecycle for PawHaven.
//!
//! ## Modules
//!
//! - `policy`: lockout arithmetic, secret generation and comparison
//! - `account`: policy-driven account security transitions
//! - `password`: Argon2id hashing and password policy enforcement
//! - `jwt`: access token signing and verification
//! - `store`: persistence contracts, in-memory stores, per-key locking
//! - `delivery`: hand-off of verification codes and reset tokens
//! - `session`: session creation, validation, refresh, and expiry sweep
//! - `service`: the operations exposed to the host layer

pub mod account;
pub mod delivery;
pub mod error;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod service;
pub mod session;
pub mod store;

pub use account::AccountSecurity;
pub use delivery::{LoggingDelivery, SecretDelivery};
pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordHashing, PasswordValidator};
pub use policy::{LockoutPolicy, SecretCheck, SecretPolicy};
pub use service::{AuthService, LoginRequest, LoginResult, RefreshResult};
pub use session::{IssuedSession, SessionCleanup, SessionManager, SessionOptions};
pub use store::{
    AccountRepository, KeyedLock, MemoryAccountRepository, MemorySessionRepository,
    SessionRepository,
};
