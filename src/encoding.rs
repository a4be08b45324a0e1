//! Token encoding: UTF-16LE bytes, then standard padded base64.

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroizing;

use crate::secret::SecretString;

/// Encode token text the way the update service expects it.
pub fn encode_token(token: &str) -> SecretString {
    let bytes: Zeroizing<Vec<u8>> =
        Zeroizing::new(token.encode_utf16().flat_map(u16::to_le_bytes).collect());
    STANDARD.encode(bytes.as_slice()).into()
}

/// Null-terminated UTF-16 copy of `s`, as the launcher reads it back.
pub fn to_wide_nul(s: &str) -> Zeroizing<Vec<u16>> {
    Zeroizing::new(s.encode_utf16().chain(std::iter::once(0)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_token_utf16le() {
        assert_eq!(encode_token("abc123").as_str(), "YQBiAGMAMQAyADMA");
    }

    #[test]
    fn test_encode_token_non_ascii() {
        assert_eq!(encode_token("tokén").as_str(), "dABvAGsA6QBuAA==");
    }

    #[test]
    fn test_encode_token_empty() {
        assert!(encode_token("").is_empty());
    }

    #[test]
    fn test_encode_token_is_deterministic() {
        let token = "t=EwC4Aq1DBAAUGCCXc8wU/zFu9QnLdZXy+YnElFkAAQ";
        assert_eq!(encode_token(token), encode_token(token));
    }

    #[test]
    fn test_to_wide_nul() {
        let wide = to_wide_nul("ab");
        assert_eq!(wide.as_slice(), &[0x61, 0x62, 0]);
    }
}
