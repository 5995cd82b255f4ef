//! Password encryption.
//!
//! Stored passwords are sealed with ChaCha20-Poly1305 under a process-wide
//! 32-byte key. Each ciphertext carries its own random nonce in a compact
//! text envelope:
//!
//! ```text
//! v1:<base64url nonce>:<base64url ciphertext+tag>
//! ```
//!
//! Decryption authenticates the payload, so a ciphertext produced under a
//! different key or tampered with yields [`CipherError::Decryption`] instead
//! of garbage.

use std::fmt;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::RngCore;
use thiserror::Error;

const ENVELOPE_VERSION: &str = "v1";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Errors from the password cipher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The configured key is not 32 bytes of base64.
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("failed to encrypt password")]
    Encryption,

    /// Ciphertext is malformed, corrupted, or was sealed under another key.
    #[error("failed to decrypt password: {0}")]
    Decryption(String),
}

/// Symmetric cipher for stored passwords.
#[derive(Clone)]
pub struct PasswordCipher {
    key: [u8; KEY_LEN],
}

impl PasswordCipher {
    /// Creates a cipher from raw key bytes.
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Creates a cipher from a base64-encoded 32-byte key.
    ///
    /// Both URL-safe (unpadded) and standard alphabets are accepted.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let encoded = encoded.trim();
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .or_else(|_| STANDARD.decode(encoded))
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;

        let key: [u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CipherError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Self::new(key))
    }

    /// Generates a fresh random key, base64url-encoded.
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        URL_SAFE_NO_PAD.encode(key)
    }

    fn aead(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
    }

    /// Encrypts a plaintext password into an envelope string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .aead()
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        Ok(format!(
            "{}:{}:{}",
            ENVELOPE_VERSION,
            URL_SAFE_NO_PAD.encode(nonce),
            URL_SAFE_NO_PAD.encode(ciphertext)
        ))
    }

    /// Decrypts an envelope produced by [`PasswordCipher::encrypt`].
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let mut parts = envelope.split(':');
        let (Some(version), Some(nonce_b64), Some(ciphertext_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CipherError::Decryption("malformed envelope".to_string()));
        };
        if version != ENVELOPE_VERSION {
            return Err(CipherError::Decryption(format!(
                "unsupported envelope version {}",
                version
            )));
        }

        let nonce = URL_SAFE_NO_PAD
            .decode(nonce_b64)
            .map_err(|e| CipherError::Decryption(format!("bad nonce: {}", e)))?;
        if nonce.len() != NONCE_LEN {
            return Err(CipherError::Decryption("bad nonce length".to_string()));
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(ciphertext_b64)
            .map_err(|e| CipherError::Decryption(format!("bad payload: {}", e)))?;

        let plaintext = self
            .aead()
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| CipherError::Decryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CipherError::Decryption("plaintext is not UTF-8".to_string()))
    }
}

impl fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCipher").finish_non_exhaustive()
    }
}
