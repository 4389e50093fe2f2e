//! Encryption for employer verify keys.
//!
//! Keys are stored AES-256-GCM encrypted under a fresh random 96-bit nonce
//! per value; the nonce is prefixed to the ciphertext and the whole blob is
//! base64. The configured secret is padded or truncated to the 32-byte key
//! size, so rotating it invalidates every stored key.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum VerifyKeyError {
    #[error("encryption failed")]
    Encrypt,
    #[error("stored value is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("stored value is malformed or was sealed with another key")]
    Decrypt,
}

#[derive(Clone)]
pub struct VerifyKeyCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for VerifyKeyCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerifyKeyCipher")
    }
}

impl VerifyKeyCipher {
    pub fn new(secret: &str) -> Self {
        let mut key_bytes = [0u8; KEY_LEN];
        let padded = secret.bytes().chain(std::iter::repeat(b'0'));
        for (slot, byte) in key_bytes.iter_mut().zip(padded) {
            *slot = byte;
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        VerifyKeyCipher { cipher }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VerifyKeyError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| VerifyKeyError::Encrypt)?;
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(nonce.as_slice());
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, VerifyKeyError> {
        let blob = BASE64.decode(encoded)?;
        if blob.len() <= NONCE_LEN {
            return Err(VerifyKeyError::Decrypt);
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VerifyKeyError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| VerifyKeyError::Decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_verify_key() {
        let cipher = VerifyKeyCipher::new("a-configured-secret");
        let sealed = cipher.encrypt("1234567890").unwrap();
        assert_ne!(sealed, "1234567890");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "1234567890");
    }

    #[test]
    fn sealing_twice_yields_distinct_blobs() {
        let cipher = VerifyKeyCipher::new("a-configured-secret");
        let first = cipher.encrypt("1234567890").unwrap();
        let second = cipher.encrypt("1234567890").unwrap();
        assert_ne!(first, second);
        assert_eq!(cipher.decrypt(&first).unwrap(), "1234567890");
        assert_eq!(cipher.decrypt(&second).unwrap(), "1234567890");
    }

    #[test]
    fn tampering_is_detected() {
        let cipher = VerifyKeyCipher::new("a-configured-secret");
        let sealed = cipher.encrypt("1234567890").unwrap();
        let mut blob = BASE64.decode(&sealed).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(cipher.decrypt(&BASE64.encode(blob)).is_err());
    }

    #[test]
    fn another_key_cannot_open_the_blob() {
        let sealed = VerifyKeyCipher::new("first-secret")
            .encrypt("1234567890")
            .unwrap();
        assert!(VerifyKeyCipher::new("second-secret").decrypt(&sealed).is_err());
    }

    #[test]
    fn truncated_blobs_are_rejected() {
        let cipher = VerifyKeyCipher::new("a-configured-secret");
        assert!(cipher.decrypt(&BASE64.encode([0u8; 5])).is_err());
        assert!(cipher.decrypt("not base64 at all!").is_err());
    }

    #[test]
    fn short_secrets_are_padded_to_key_size() {
        let cipher = VerifyKeyCipher::new("abc");
        let sealed = cipher.encrypt("0987654321").unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "0987654321");
    }
}
