//! RS256 signing and verification over raw byte messages

use crate::{base64url, Result, TokenError};
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};
use std::fmt;
use std::path::PathBuf;

/// Where PEM key material comes from
#[derive(Clone, Debug)]
pub enum KeySource {
    /// A PEM file on the device filesystem
    File(PathBuf),
    /// PEM bytes already in memory
    Pem(Vec<u8>),
}

impl KeySource {
    /// Key stored in a file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Key given inline
    pub fn pem(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Pem(bytes.into())
    }

    /// Human-readable origin, used in load errors
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Pem(_) => "inline PEM".to_string(),
        }
    }

    /// Read the PEM bytes
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => std::fs::read(path).map_err(|e| TokenError::KeyLoad {
                source_name: self.describe(),
                reason: e.to_string(),
            }),
            Self::Pem(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Signs and verifies messages with a fixed RSA key pair.
///
/// Keys are parsed once at construction; a bad key is reported then, so
/// `verify` can only ever answer yes or no.
#[derive(Clone)]
pub struct SignatureEngine {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SignatureEngine {
    /// Load the private and public halves from their sources
    pub fn from_sources(private: &KeySource, public: &KeySource) -> Result<Self> {
        let private_pem = private.load()?;
        let public_pem = public.load()?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Build from PEM bytes (PKCS#1 or PKCS#8 private key, SPKI or PKCS#1 public key)
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::InvalidKey(format!("private key: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key: {e}")))?;
        Ok(Self { encoding, decoding })
    }

    /// Sign `message`, returning the raw signature bytes
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let encoded = crypto::sign(message, &self.encoding, Algorithm::RS256)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        base64url::decode(encoded)
    }

    /// Check `signature` against `message`.
    ///
    /// A malformed or mismatching signature is `false`, never an error.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let encoded = base64url::encode(signature);
        match crypto::verify(&encoded, message, &self.decoding, Algorithm::RS256) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::debug!(error = %e, "Signature verification rejected input");
                false
            }
        }
    }
}

impl fmt::Debug for SignatureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureEngine")
            .field("algorithm", &crate::ALGORITHM)
            .finish_non_exhaustive()
    }
}
