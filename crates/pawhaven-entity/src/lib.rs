//! # pawhaven-entity
//!
//! Domain entity models for PawHaven authentication. Every struct in this
//! crate is either a persisted row (accounts, sessions) or a value object
//! derived from one. Entities never hash, sign, or read the clock on their
//! own: callers pass digests and the current instant explicitly.

pub mod account;
pub mod secret;
pub mod session;

pub use account::{Account, AccountCore, AccountKind, AccountStatus, NewAccount, PublicAccount};
pub use secret::ExpiringSecret;
pub use session::{DeviceInfo, Session, SessionKey, TokenPair};
