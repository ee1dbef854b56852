//! Session domain entities.

pub mod device;
pub mod model;
pub mod token;

pub use device::DeviceInfo;
pub use model::{NewSession, SafeSession, Session, SessionActivity, SessionKey, SessionValidity};
pub use token::TokenPair;
