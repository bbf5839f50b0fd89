//! Reversible identifier obfuscation using AES-256-GCM.
//!
//! The codec turns a plaintext payload into `base64(nonce || ciphertext)`
//! under a key taken from configuration. A fresh nonce is generated per call,
//! so encrypting the same payload twice yields different ciphertexts that
//! both decrypt to the original.

use crate::config::Config;
use aes_gcm::aead::rand_core::{OsRng, RngCore};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use serde_json::{Value, json};

/// AES-256-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

#[derive(Debug)]
pub enum CryptoError {
    InvalidKey,
    EncryptionFailed,
    DecryptionFailed,
    InvalidData,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::InvalidKey => write!(f, "Invalid encryption key"),
            CryptoError::EncryptionFailed => write!(f, "Encryption failed"),
            CryptoError::DecryptionFailed => write!(f, "Decryption failed"),
            CryptoError::InvalidData => write!(f, "Invalid data format"),
        }
    }
}

impl std::error::Error for CryptoError {}

/// Symmetric codec for opaque organizer tokens and encrypted envelopes.
#[derive(Clone)]
pub struct Codec {
    cipher: Aes256Gcm,
}

impl Codec {
    /// Builds a codec from the configured key. The key is either a
    /// base64-encoded 256-bit key (44 characters) or a raw passphrase that
    /// is zero-padded or truncated to 32 bytes. An empty key is rejected.
    pub fn new(config: &Config) -> Result<Self, CryptoError> {
        let key_str = &config.encryption_key;

        if key_str.is_empty() {
            return Err(CryptoError::InvalidKey);
        }

        let key_bytes = if key_str.len() == 44 {
            general_purpose::STANDARD
                .decode(key_str)
                .map_err(|_| CryptoError::InvalidKey)?
        } else {
            let mut bytes = vec![0u8; 32];
            let input_bytes = key_str.as_bytes();
            let copy_len = std::cmp::min(input_bytes.len(), 32);
            bytes[..copy_len].copy_from_slice(&input_bytes[..copy_len]);
            bytes
        };

        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKey);
        }

        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Codec {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Encrypts a payload and returns the base64-encoded `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(result))
    }

    /// Decrypts a base64-encoded payload produced by `encrypt()`.
    pub fn decrypt(&self, encrypted_data: &str) -> Result<Vec<u8>, CryptoError> {
        let data = general_purpose::STANDARD
            .decode(encrypted_data)
            .map_err(|_| CryptoError::InvalidData)?;

        if data.len() < NONCE_LEN {
            return Err(CryptoError::InvalidData);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Wraps a value in the encrypted response envelope.
///
/// On success the body is `{success: true, data: <ciphertext>, timestamp}`.
/// Any failure, including a missing codec, produces the
/// `{success: false, error: "Encryption failed", timestamp}` fallback instead
/// of an error; callers treat encryption failures as non-fatal.
pub fn encrypt_response(codec: Option<&Codec>, data: &Value) -> Value {
    let encrypted = codec.and_then(|codec| {
        serde_json::to_string(data)
            .ok()
            .and_then(|serialized| codec.encrypt(serialized.as_bytes()).ok())
    });

    match encrypted {
        Some(ciphertext) => json!({
            "success": true,
            "data": ciphertext,
            "timestamp": Utc::now().timestamp(),
        }),
        None => json!({
            "success": false,
            "error": "Encryption failed",
            "timestamp": Utc::now().timestamp(),
        }),
    }
}
