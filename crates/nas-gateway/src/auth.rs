//! Token issuance and bearer authentication

use crate::ApiError;
use nas_accounts::{CredentialStore, UserData, UserId};
use nas_token::{base64url, token, SignatureEngine, TokenClaims, TokenHeader};
use serde::Deserialize;
use std::sync::Arc;

/// Prefix of the Authorization header value
pub const BEARER_PREFIX: &str = "Bearer ";

/// The only claim read back from an inbound token
#[derive(Deserialize)]
struct IdentityClaim {
    id: UserId,
}

/// Issues tokens for verified credentials and validates inbound tokens
#[derive(Clone, Debug)]
pub struct AuthGateway {
    engine: Arc<SignatureEngine>,
}

impl AuthGateway {
    pub fn new(engine: Arc<SignatureEngine>) -> Self {
        Self { engine }
    }

    /// Sign a token carrying `claims`.
    ///
    /// The result depends only on the claims and the key.
    pub fn issue_token(&self, claims: &TokenClaims) -> Result<String, ApiError> {
        let header = base64url::encode(serde_json::to_vec(&TokenHeader::default())?);
        let payload = base64url::encode(serde_json::to_vec(claims)?);

        let signature = self.engine.sign(&token::assemble(&header, &payload))?;
        Ok(token::build(&header, &payload, &base64url::encode(signature)))
    }

    /// Resolve the caller's user id from an Authorization header value
    pub fn authenticate_request(&self, header: Option<&str>) -> Result<UserId, ApiError> {
        let header = header.ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
        let compact = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let parsed = token::split(compact).map_err(|e| {
            tracing::debug!(error = %e, "Rejected malformed token");
            ApiError::unauthorized("Malformed token")
        })?;

        if !self.engine.verify(&parsed.signing_input(), &parsed.signature) {
            return Err(ApiError::unauthorized("Invalid token signature"));
        }

        let identity: IdentityClaim = serde_json::from_slice(&parsed.payload).map_err(|e| {
            tracing::debug!(error = %e, "Rejected token payload");
            ApiError::unauthorized("Missing id field in token payload")
        })?;
        Ok(identity.id)
    }

    /// Check credentials against the store and issue a token on success
    pub fn login(
        &self,
        store: &dyn CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<String, ApiError> {
        let user: UserData = store
            .authenticate(username, password)?
            .ok_or(ApiError::InvalidCredentials)?;

        tracing::info!(user_id = user.id, "User logged in");
        self.issue_token(&TokenClaims::new(user.id, user.username))
    }
}
