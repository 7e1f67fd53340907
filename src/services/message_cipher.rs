use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// Shown in place of a message body that can no longer be decrypted, for
/// example after a key change or a corrupted row. Readers see this string
/// instead of the request failing.
pub const DECRYPT_FAILURE_PLACEHOLDER: &str = "[Encrypted Message]";

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed")]
    DecryptionFailed,
    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("Invalid base64 data: {0}")]
    InvalidBase64(String),
    #[error("Invalid encrypted data format")]
    InvalidDataFormat,
}

/// AES-256-GCM cipher for message bodies at rest. The random nonce is
/// prepended to the ciphertext and the whole blob is base64 encoded, so a
/// stored message is self-contained.
pub struct MessageCipher {
    key: Vec<u8>,
}

impl MessageCipher {
    pub fn new(key: Vec<u8>) -> Result<Self, CipherError> {
        if key.len() != 32 {
            return Err(CipherError::InvalidKeyLength(key.len()));
        }
        Ok(Self { key })
    }

    /// Encrypt a message body. Empty input stays empty so blank bodies stay
    /// recognizable in storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let key = Key::<Aes256Gcm>::from_slice(&self.key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypt a stored message body. Failure never propagates: anything
    /// that does not decrypt comes back as the placeholder string.
    pub fn decrypt(&self, stored: &str) -> String {
        if stored.is_empty() {
            return String::new();
        }

        match self.try_decrypt(stored) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                tracing::warn!("Failed to decrypt stored message: {}", e);
                DECRYPT_FAILURE_PLACEHOLDER.to_string()
            }
        }
    }

    fn try_decrypt(&self, stored: &str) -> Result<String, CipherError> {
        let combined = BASE64
            .decode(stored)
            .map_err(|e| CipherError::InvalidBase64(e.to_string()))?;

        // Nonce is 12 bytes for AES-GCM.
        if combined.len() < 12 {
            return Err(CipherError::InvalidDataFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(12);

        let key = Key::<Aes256Gcm>::from_slice(&self.key);
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CipherError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidDataFormat)
    }

    /// Generate a fresh random key, base64 encoded for the environment.
    pub fn generate_key() -> String {
        let mut key = vec![0u8; 32];
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(&mut key);
        BASE64.encode(key)
    }
}

impl std::fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> MessageCipher {
        MessageCipher::new(b"0123456789abcdef0123456789abcdef".to_vec()).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let cipher = test_cipher();

        let encrypted = cipher.encrypt("Hi, want to trade guitar lessons?").unwrap();
        assert_ne!(encrypted, "Hi, want to trade guitar lessons?");
        assert_eq!(cipher.decrypt(&encrypted), "Hi, want to trade guitar lessons?");
    }

    #[test]
    fn test_fresh_nonce_per_message() {
        let cipher = test_cipher();

        let first = cipher.encrypt("same text").unwrap();
        let second = cipher.encrypt("same text").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_empty_body_passes_through() {
        let cipher = test_cipher();

        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt(""), "");
    }

    #[test]
    fn test_garbage_input_yields_placeholder() {
        let cipher = test_cipher();

        assert_eq!(cipher.decrypt("not base64 at all!"), DECRYPT_FAILURE_PLACEHOLDER);
        // Valid base64 but too short to hold a nonce.
        assert_eq!(cipher.decrypt(&BASE64.encode(b"abc")), DECRYPT_FAILURE_PLACEHOLDER);
    }

    #[test]
    fn test_wrong_key_yields_placeholder() {
        let cipher = test_cipher();
        let other = MessageCipher::new(b"ffffffffffffffffffffffffffffffff".to_vec()).unwrap();

        let encrypted = cipher.encrypt("secret plan").unwrap();
        assert_eq!(other.decrypt(&encrypted), DECRYPT_FAILURE_PLACEHOLDER);
    }

    #[test]
    fn test_rejects_short_keys() {
        let result = MessageCipher::new(vec![0u8; 16]);
        assert!(matches!(result, Err(CipherError::InvalidKeyLength(16))));
    }

    #[test]
    fn test_generated_key_is_32_bytes() {
        let key = MessageCipher::generate_key();
        let decoded = BASE64.decode(key).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn test_debug_redacts_key() {
        let cipher = test_cipher();
        let rendered = format!("{:?}", cipher);
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
