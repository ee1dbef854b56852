//! Policy-driven account security transitions.

pub mod state;

pub use state::AccountSecurity;
