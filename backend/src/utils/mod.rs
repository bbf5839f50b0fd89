//! Collection of general utility functions shared across the backend.

use percent_encoding::percent_decode_str;
use rand::RngCore;

pub mod crypto;
pub mod organizer;
pub mod url_safe;

/// Generates a secure API token: `length` random bytes, hex encoded.
/// The default of 32 bytes yields 64 hex characters.
pub fn generate_token(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Percent-decodes a URL component, treating `+` as a space.
pub fn url_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_length_and_charset() {
        let token = generate_token(32);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_uniqueness() {
        assert_ne!(generate_token(32), generate_token(32));
    }

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("abc%2Fdef"), "abc/def");
        assert_eq!(url_decode("a+b"), "a b");
        assert_eq!(url_decode("plain-_value"), "plain-_value");
    }
}
