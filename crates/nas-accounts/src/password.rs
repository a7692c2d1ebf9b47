//! Salted password digests
//!
//! A keyed BLAKE3 digest is a fast hash, not a password KDF. It is good
//! enough for the in-memory store, which keeps nothing across restarts. A
//! persistent store should use a memory-hard KDF such as Argon2 instead.

use rand::RngCore;

/// Length of a per-account salt in bytes
pub const SALT_LEN: usize = 16;

const CONTEXT: &str = "nas-accounts 2024-01-01 password digest v1";

/// A salted password digest
#[derive(Clone, Debug)]
pub struct PasswordHash {
    salt: [u8; SALT_LEN],
    digest: blake3::Hash,
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt
    pub fn new(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(salt, password)
    }

    /// Hash `password` with a given salt
    pub fn with_salt(salt: [u8; SALT_LEN], password: &str) -> Self {
        Self {
            salt,
            digest: digest(&salt, password),
        }
    }

    /// Check a candidate password; comparison is constant time
    pub fn verify(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.digest
    }
}

fn digest(salt: &[u8; SALT_LEN], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}
