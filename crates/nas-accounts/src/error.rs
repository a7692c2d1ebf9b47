//! Error types for the nas-accounts crate

use crate::UserId;
use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by a credential store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unique constraint on the username violated
    #[error("username already exists: {0}")]
    UsernameTaken(String),

    /// Account does not exist
    #[error("no such user: {0}")]
    NoSuchUser(UserId),

    /// Backend failure
    #[error("credential store error: {0}")]
    Internal(String),
}
