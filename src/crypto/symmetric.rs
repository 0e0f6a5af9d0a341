//! Authenticated encryption envelope.
//!
//! An envelope is `nonce (12 bytes) || ciphertext || tag (16 bytes)` produced by
//! AES-256-GCM with no associated data, then encoded as standard padded base64
//! so it can travel inside a text frame.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use super::keys::KEY_SIZE;

/// Nonce size for AES-GCM.
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size for AES-GCM.
pub const TAG_SIZE: usize = 16;

/// Errors that can occur while sealing or opening an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    KeySize { expected: usize, actual: usize },

    #[error("Random source unavailable: {0}")]
    Randomness(String),

    #[error("Encryption failed")]
    Encrypt,

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Authentication failed")]
    Authentication,

    #[error("Decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

fn cipher_for(key: &[u8]) -> Result<Aes256Gcm, EnvelopeError> {
    Aes256Gcm::new_from_slice(key).map_err(|_| EnvelopeError::KeySize {
        expected: KEY_SIZE,
        actual: key.len(),
    })
}

/// Encrypts `plaintext` under `key` and returns the base64 envelope.
///
/// A fresh nonce is drawn from the OS random source on every call.
pub fn seal_envelope(plaintext: &str, key: &[u8]) -> Result<String, EnvelopeError> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|e| EnvelopeError::Randomness(e.to_string()))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let sealed = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| EnvelopeError::Encrypt)?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + sealed.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&sealed);

    Ok(STANDARD.encode(envelope))
}

/// Decodes and decrypts a base64 envelope.
pub fn open_envelope(text: &str, key: &[u8]) -> Result<String, EnvelopeError> {
    let data = STANDARD
        .decode(text)
        .map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))?;

    if data.len() < NONCE_SIZE {
        return Err(EnvelopeError::MalformedEnvelope(format!(
            "{} bytes is shorter than the nonce",
            data.len()
        )));
    }

    let cipher = cipher_for(key)?;
    let (nonce_bytes, sealed) = data.split_at(NONCE_SIZE);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| EnvelopeError::Authentication)?;

    String::from_utf8(plaintext).map_err(|_| EnvelopeError::InvalidUtf8)
}

/// Length in characters of the envelope for a plaintext of `plaintext_len` bytes.
pub fn envelope_text_len(plaintext_len: usize) -> usize {
    let raw = NONCE_SIZE + plaintext_len + TAG_SIZE;
    raw.div_ceil(3) * 4
}
