//! Credential policy engine: pure functions over value snapshots.
//!
//! Nothing in this module performs I/O or reads the clock; the current
//! instant is always a parameter.

pub mod lockout;
pub mod secret;

pub use lockout::{LockoutPolicy, LoginAttemptOutcome, can_authenticate, is_locked};
pub use secret::{
    IssuedSecret, SecretCheck, SecretPolicy, check_secret, digests_match,
    generate_token, generate_verification_code, token_digest,
};
