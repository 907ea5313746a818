//! Authenticated symmetric encryption for cookies and URL parameters.
//!
//! AES-256-GCM with a random nonce per message. The wire format is
//! base64(nonce || ciphertext+tag); the tag is appended by AES-GCM itself.
//! Decryption returns `None` rather than an error: an unopenable payload
//! always means "re-authenticate", never a server fault.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Nonce size for AES-256-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Authentication tag size appended by AES-GCM.
const TAG_SIZE: usize = 16;

/// Key size (256 bits).
pub const KEY_SIZE: usize = 32;

/// A symmetric secret box bound to one 256-bit key.
#[derive(Clone)]
pub struct SecretBox {
    cipher: Aes256Gcm,
}

impl SecretBox {
    /// Creates a box from raw key bytes.
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Creates a box from a base64-encoded key, as carried in configuration.
    /// Returns `None` when the encoding is invalid or the key is not 32 bytes.
    pub fn from_base64(encoded: &str) -> Option<Self> {
        let bytes = BASE64.decode(encoded.trim()).ok()?;
        let key: [u8; KEY_SIZE] = bytes.try_into().ok()?;
        Some(Self::new(&key))
    }

    /// Generates a fresh random key and returns the box together with the
    /// base64 encoding of the key (for sharing across processes).
    pub fn generate() -> (Self, String) {
        let key = Aes256Gcm::generate_key(OsRng);
        (
            Self {
                cipher: Aes256Gcm::new(&key),
            },
            BASE64.encode(key),
        )
    }

    /// Encrypts `plaintext` under a fresh nonce.
    pub fn seal(&self, plaintext: &[u8]) -> String {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // Encryption with a valid key and fresh nonce cannot fail
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .expect("AES-GCM encryption");

        let mut message = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        message.extend_from_slice(&nonce);
        message.extend_from_slice(&ciphertext);
        BASE64.encode(message)
    }

    /// Decrypts a sealed message.
    ///
    /// Returns `None` on bad base64, truncated input, a tampered ciphertext,
    /// or a key mismatch.
    pub fn open(&self, encoded: &str) -> Option<Vec<u8>> {
        let message = BASE64.decode(encoded).ok()?;
        if message.len() < NONCE_SIZE + TAG_SIZE {
            return None;
        }
        let nonce = Nonce::from_slice(&message[..NONCE_SIZE]);
        self.cipher.decrypt(nonce, &message[NONCE_SIZE..]).ok()
    }

    /// Decrypts a sealed message into a UTF-8 string.
    pub fn open_str(&self, encoded: &str) -> Option<String> {
        String::from_utf8(self.open(encoded)?).ok()
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material
        f.write_str("SecretBox")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_box() -> SecretBox {
        SecretBox::new(&[7u8; KEY_SIZE])
    }

    #[test]
    fn test_seal_open_round_trip() {
        let sbox = test_box();
        let sealed = sbox.seal(b"root:secret");
        assert_eq!(sbox.open(&sealed).as_deref(), Some(&b"root:secret"[..]));
        assert_eq!(sbox.open_str(&sealed).as_deref(), Some("root:secret"));
    }

    #[test]
    fn test_nonces_are_fresh() {
        let sbox = test_box();
        assert_ne!(sbox.seal(b"same"), sbox.seal(b"same"));
    }

    #[test]
    fn test_open_with_wrong_key_is_none() {
        let sealed = test_box().seal(b"payload");
        let other = SecretBox::new(&[8u8; KEY_SIZE]);
        assert_eq!(other.open(&sealed), None);
    }

    #[test]
    fn test_open_corrupted_is_none() {
        let sbox = test_box();
        let sealed = sbox.seal(b"payload");
        let mut raw = BASE64.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert_eq!(sbox.open(&BASE64.encode(raw)), None);
    }

    #[test]
    fn test_open_truncated_is_none() {
        let sbox = test_box();
        assert_eq!(sbox.open(&BASE64.encode([0u8; NONCE_SIZE])), None);
        assert_eq!(sbox.open(""), None);
    }

    #[test]
    fn test_open_bad_base64_is_none() {
        assert_eq!(test_box().open("not base64 !!"), None);
    }

    #[test]
    fn test_from_base64_key() {
        let (sbox, key) = SecretBox::generate();
        let sealed = sbox.seal(b"x");
        let restored = SecretBox::from_base64(&key).unwrap();
        assert_eq!(restored.open(&sealed).as_deref(), Some(&b"x"[..]));

        assert!(SecretBox::from_base64("short").is_none());
        assert!(SecretBox::from_base64("").is_none());
    }
}
