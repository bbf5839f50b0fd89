//! URL-safe transform for base64 ciphertext embedded in URL paths.
//!
//! This is a pure string transform, independent of the cipher: `+` becomes
//! `-`, `/` becomes `_` and trailing `=` padding is stripped so the token can
//! live in a path segment. Decoding reverses the mapping and re-pads to a
//! multiple of four. Decoding never fails; padding is restored
//! deterministically even for lengths no base64 encoder produces.

/// Makes a standard-base64 string safe for use in a URL path segment.
pub fn encode_token(base64_data: &str) -> String {
    base64_data
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string()
}

/// Restores a URL-safe token to standard base64 with padding.
pub fn decode_token(encoded: &str) -> String {
    let mut data = encoded.replace('-', "+").replace('_', "/");
    let rem = data.len() % 4;
    if rem != 0 {
        data.push_str(&"=".repeat(4 - rem));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose};

    #[test]
    fn test_round_trip_all_padding_lengths() {
        // Byte lengths chosen to produce 0, 1 and 2 padding characters.
        for len in 1..=6 {
            let bytes: Vec<u8> = (0..len).map(|i| 0xF0 + i as u8).collect();
            let base64 = general_purpose::STANDARD.encode(&bytes);

            let token = encode_token(&base64);
            assert!(!token.contains('+'));
            assert!(!token.contains('/'));
            assert!(!token.contains('='));

            assert_eq!(decode_token(&token), base64);
        }
    }

    #[test]
    fn test_remaps_special_characters() {
        // 0xFB 0xFF encodes to "+/8=" territory; force both specials.
        let base64 = general_purpose::STANDARD.encode([0xFBu8, 0xEF, 0xBE]);
        assert!(base64.contains('+') || base64.contains('/'));

        let token = encode_token(&base64);
        assert_eq!(decode_token(&token), base64);
    }

    #[test]
    fn test_decode_odd_length_does_not_panic() {
        // Length 5 is not a valid base64 length; padding is still applied
        // deterministically and the result has a multiple-of-four length.
        let restored = decode_token("abcde");
        assert_eq!(restored.len() % 4, 0);
        assert!(restored.ends_with("="));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(encode_token(""), "");
        assert_eq!(decode_token(""), "");
    }
}
