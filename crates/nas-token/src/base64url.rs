//! URL-safe base64 without padding (RFC 4648 §5)

use crate::{Result, TokenError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

/// Encode bytes as unpadded base64url text
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode unpadded base64url text back to the exact original bytes.
///
/// Padding characters, characters outside the URL-safe alphabet, impossible
/// lengths and non-canonical trailing bits are all rejected.
pub fn decode(text: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| TokenError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"", "")]
    #[case(b"f", "Zg")]
    #[case(b"fo", "Zm8")]
    #[case(b"foo", "Zm9v")]
    #[case(b"foob", "Zm9vYg")]
    #[case(b"fooba", "Zm9vYmE")]
    #[case(b"foobar", "Zm9vYmFy")]
    fn test_rfc4648_vectors(#[case] raw: &[u8], #[case] text: &str) {
        assert_eq!(encode(raw), text);
        assert_eq!(decode(text).unwrap(), raw);
    }

    #[test]
    fn test_url_safe_alphabet() {
        // 0xfb 0xff maps to '+' and '/' in the standard alphabet
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[rstest]
    #[case("+/8")]
    #[case("Zg==")]
    #[case("Zm9v!")]
    #[case("A")]
    #[case("Zh")]
    fn test_rejects_invalid_input(#[case] text: &str) {
        assert!(matches!(decode(text), Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_binary_data_survives() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(decode(encode(&data)).unwrap(), data);
    }

    proptest! {
        #[test]
        fn test_encoding_is_unpadded_url_safe(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let text = encode(&data);
            prop_assert_eq!(text.len(), (data.len() * 4).div_ceil(3));
            prop_assert!(text.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
            prop_assert_eq!(decode(&text).unwrap(), data);
        }
    }
}
