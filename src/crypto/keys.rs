//! Session key derivation.
//!
//! Every peer that knows the passphrase must end up with the same key without
//! talking to anyone first, so the key is a single unsalted SHA-256 over the
//! passphrase bytes. This is not a password-storage scheme: captured traffic
//! can be attacked offline with a dictionary.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key width required by AES-256-GCM.
pub const KEY_SIZE: usize = 32;

/// Symmetric key shared by every peer using the same passphrase.
///
/// Immutable once derived and wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_SIZE]);

impl SessionKey {
    /// Derives the key as `SHA-256(passphrase)`.
    pub fn derive(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&digest);
        Self(key)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Short hex fingerprint (first 4 bytes of SHA-256 over the key).
    ///
    /// Lets two users compare passphrases out loud without revealing them.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionKey")
            .field(&self.fingerprint())
            .finish()
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SessionKey {}
