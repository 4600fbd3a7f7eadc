//! Convenience result type alias for Duet.

use crate::error::AppError;

/// A specialized `Result` type for Duet operations.
pub type AppResult<T> = Result<T, AppError>;
