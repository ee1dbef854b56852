//! Account domain entities.

pub mod kind;
pub mod model;
pub mod public;
pub mod status;

pub use kind::{AccountKind, UserRole};
pub use model::{Account, AccountCore, NewAccount};
pub use public::{LoginActivity, PublicAccount};
pub use status::AccountStatus;
