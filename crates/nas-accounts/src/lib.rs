//! # NAS Accounts
//!
//! User accounts for the NAS gateway.
//!
//! This crate provides:
//! - **CredentialStore trait**: lookup, verification and maintenance of accounts
//! - **Password hashing**: salted, keyed BLAKE3 digests (fast hashing, not a
//!   password KDF; see [`password`])
//! - **Memory backend**: an in-memory store for single-device deployments and tests

pub mod error;
pub mod memory;
pub mod password;

pub use error::{Result, StoreError};
pub use memory::MemoryCredentialStore;

use serde::{Deserialize, Serialize};

/// Identifier of a user account
pub type UserId = i64;

/// Public data of an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: UserId,
    pub username: String,
}

/// Storage of user accounts and their credentials.
///
/// Implementations serialize their own writes.
pub trait CredentialStore: Send + Sync {
    /// Verify a username/password pair; `None` when there is no match
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserData>>;

    /// Look up an account by id
    fn get_user(&self, id: UserId) -> Result<Option<UserData>>;

    /// Create an account with a fresh id
    fn create_user(&self, username: &str, password: &str) -> Result<UserData>;

    /// Delete an account
    fn delete_user(&self, id: UserId) -> Result<()>;

    /// Change the username of an account
    fn update_username(&self, id: UserId, username: &str) -> Result<()>;

    /// Change the password of an account
    fn update_password(&self, id: UserId, password: &str) -> Result<()>;
}
