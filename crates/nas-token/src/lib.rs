//! # NAS Token
//!
//! Bearer token primitives for the NAS gateway.
//!
//! This crate provides:
//! - **Base64URL**: RFC 4648 URL-safe encoding without padding
//! - **Token codec**: the three-segment `header.payload.signature` structure
//! - **Signature engine**: RS256 signing and verification with PEM key material
//!
//! The signature always covers the *encoded* `header.payload` bytes, never the
//! decoded claims.
//!
//! ## Example
//!
//! ```rust,ignore
//! use nas_token::{base64url, token, KeySource, SignatureEngine};
//!
//! let engine = SignatureEngine::from_sources(
//!     &KeySource::file("/etc/nas/private.pem"),
//!     &KeySource::file("/etc/nas/public.pem"),
//! )?;
//!
//! let input = token::assemble(&header_seg, &payload_seg);
//! let signature = engine.sign(&input)?;
//! let compact = token::build(&header_seg, &payload_seg, &base64url::encode(&signature));
//! ```

pub mod base64url;
pub mod claims;
pub mod error;
pub mod signature;
pub mod token;

pub use claims::{TokenClaims, TokenHeader};
pub use error::{Result, TokenError};
pub use signature::{KeySource, SignatureEngine};
pub use token::ParsedToken;

/// Algorithm name written into every token header
pub const ALGORITHM: &str = "RS256";

/// Token type written into every token header
pub const TOKEN_TYPE: &str = "JWT";
