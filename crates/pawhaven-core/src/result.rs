//! Convenience result type alias for PawHaven.

use crate::error::AppError;

/// A specialized `Result` type for PawHaven operations.
pub type AppResult<T> = Result<T, AppError>;
