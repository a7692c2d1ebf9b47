//! Header and claim structures carried in the first two token segments

use crate::{ALGORITHM, TOKEN_TYPE};
use serde::{Deserialize, Serialize};

/// Fixed token header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Claims issued to an authenticated user.
///
/// There is deliberately no expiry or issued-at claim, so the same user and
/// key always produce the same token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    pub username: String,
}

impl TokenClaims {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}
