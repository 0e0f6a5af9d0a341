//! Cryptographic operations for lanchat.
//!
//! - Session key derivation from the shared passphrase (SHA-256)
//! - The AES-256-GCM envelope carried inside every chat frame

pub mod keys;
pub mod symmetric;

pub use keys::{SessionKey, KEY_SIZE};
pub use symmetric::{
    envelope_text_len, open_envelope, seal_envelope, EnvelopeError, NONCE_SIZE, TAG_SIZE,
};
