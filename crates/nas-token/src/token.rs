//! Three-segment token structure: `header.payload.signature`

use crate::{base64url, Result, TokenError};

/// Separator between token segments
pub const SEGMENT_SEPARATOR: char = '.';

/// The decoded segments of an inbound token.
///
/// The raw encoded header and payload are kept alongside the decoded bytes
/// because the signature covers the encoded form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedToken {
    /// Decoded header JSON
    pub header: Vec<u8>,
    /// Decoded payload JSON
    pub payload: Vec<u8>,
    /// Decoded signature bytes
    pub signature: Vec<u8>,
    raw_header: String,
    raw_payload: String,
}

impl ParsedToken {
    /// Encoded header segment as received
    pub fn raw_header(&self) -> &str {
        &self.raw_header
    }

    /// Encoded payload segment as received
    pub fn raw_payload(&self) -> &str {
        &self.raw_payload
    }

    /// The exact bytes the signature must verify against
    pub fn signing_input(&self) -> Vec<u8> {
        assemble(&self.raw_header, &self.raw_payload)
    }
}

/// Split a compact token into its three decoded segments.
///
/// Anything other than exactly three segments is a `MalformedToken`; a
/// segment that is not valid base64url is a `Decode` error.
pub fn split(token: &str) -> Result<ParsedToken> {
    let segments: Vec<&str> = token.split(SEGMENT_SEPARATOR).collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(TokenError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    Ok(ParsedToken {
        header: base64url::decode(header)?,
        payload: base64url::decode(payload)?,
        signature: base64url::decode(signature)?,
        raw_header: (*header).to_string(),
        raw_payload: (*payload).to_string(),
    })
}

/// Build the signing input from the two encoded segments
pub fn assemble(header_segment: &str, payload_segment: &str) -> Vec<u8> {
    let mut input = Vec::with_capacity(header_segment.len() + payload_segment.len() + 1);
    input.extend_from_slice(header_segment.as_bytes());
    input.push(SEGMENT_SEPARATOR as u8);
    input.extend_from_slice(payload_segment.as_bytes());
    input
}

/// Join all three encoded segments into a compact token
pub fn build(header_segment: &str, payload_segment: &str, signature_segment: &str) -> String {
    format!("{header_segment}{SEGMENT_SEPARATOR}{payload_segment}{SEGMENT_SEPARATOR}{signature_segment}")
}
