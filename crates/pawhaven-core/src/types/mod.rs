//! Core type definitions used across the PawHaven workspace.

pub mod id;

pub use id::*;
