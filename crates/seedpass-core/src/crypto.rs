//! Authenticated encryption for vault secrets
//!
//! AES-256-GCM under a [`DerivedKey`], empty associated data.
//!
//! # Security Notes
//!
//! - Every encryption draws a fresh 96-bit nonce from the OS CSPRNG
//! - The ciphertext carries the 16-byte GCM tag; any bit flip fails decryption
//! - Decrypted plaintext is handed back in a [`Zeroizing`] wrapper

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

use crate::kdf::DerivedKey;

/// Nonce length for AES-256-GCM
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
    #[error("Invalid nonce length: expected {NONCE_LEN} bytes, got {0}")]
    InvalidNonceLength(usize),
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// One encrypted secret: nonce plus ciphertext-with-tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedSecret {
    /// Reassemble from stored parts.
    ///
    /// The nonce length is checked here; the ciphertext is only checked by
    /// the GCM tag on decryption.
    pub fn from_parts(nonce: &[u8], ciphertext: Vec<u8>) -> Result<Self, CryptoError> {
        let nonce: [u8; NONCE_LEN] = nonce
            .try_into()
            .map_err(|_| CryptoError::InvalidNonceLength(nonce.len()))?;
        Ok(Self { nonce, ciphertext })
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext including the trailing authentication tag
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Encrypt a secret under `key` with a fresh random nonce
pub fn encrypt_secret(key: &DerivedKey, secret: &str) -> Result<EncryptedSecret, CryptoError> {
    let nonce_arr = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&nonce_arr);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), secret.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedSecret { nonce, ciphertext })
}

/// Decrypt a secret.
///
/// # Errors
/// Returns `DecryptionFailed` if the key is wrong, the ciphertext or nonce
/// was tampered with, or the plaintext is not UTF-8.
pub fn decrypt_secret(
    key: &DerivedKey,
    encrypted: &EncryptedSecret,
) -> Result<Zeroizing<String>, CryptoError> {
    if encrypted.ciphertext.len() < TAG_LEN {
        return Err(CryptoError::DecryptionFailed(
            "Ciphertext shorter than authentication tag".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&encrypted.nonce),
            encrypted.ciphertext.as_slice(),
        )
        .map_err(|_| CryptoError::DecryptionFailed("Wrong key or corrupted data".to_string()))?;

    String::from_utf8(plaintext).map(Zeroizing::new).map_err(|e| {
        e.into_bytes().zeroize();
        CryptoError::DecryptionFailed("Plaintext is not valid UTF-8".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::derive_key;

    fn test_key() -> DerivedKey {
        derive_key("correct horse battery staple").unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let encrypted = encrypt_secret(&key, "hunter2").unwrap();
        let decrypted = decrypt_secret(&key, &encrypted).unwrap();
        assert_eq!(*decrypted, "hunter2");
    }

    #[test]
    fn test_ciphertext_carries_tag() {
        let key = test_key();
        let encrypted = encrypt_secret(&key, "hunter2").unwrap();
        assert_eq!(encrypted.ciphertext().len(), "hunter2".len() + TAG_LEN);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt_secret(&test_key(), "hunter2").unwrap();
        let other = derive_key("wrong password").unwrap();
        assert!(matches!(
            decrypt_secret(&other, &encrypted),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let key = test_key();
        let e1 = encrypt_secret(&key, "same secret").unwrap();
        let e2 = encrypt_secret(&key, "same secret").unwrap();

        assert_ne!(e1.nonce(), e2.nonce());
        assert_ne!(e1.ciphertext(), e2.ciphertext());

        assert_eq!(*decrypt_secret(&key, &e1).unwrap(), "same secret");
        assert_eq!(*decrypt_secret(&key, &e2).unwrap(), "same secret");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let encrypted = encrypt_secret(&key, "hunter2").unwrap();

        let mut bytes = encrypted.ciphertext().to_vec();
        bytes[0] ^= 0xFF;
        let tampered = EncryptedSecret::from_parts(encrypted.nonce(), bytes).unwrap();

        assert!(decrypt_secret(&key, &tampered).is_err());
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = test_key();
        let encrypted = encrypt_secret(&key, "hunter2").unwrap();

        let mut nonce = *encrypted.nonce();
        nonce[0] ^= 0x01;
        let tampered =
            EncryptedSecret::from_parts(&nonce, encrypted.ciphertext().to_vec()).unwrap();

        assert!(decrypt_secret(&key, &tampered).is_err());
    }

    #[test]
    fn test_bad_nonce_length_rejected() {
        assert!(matches!(
            EncryptedSecret::from_parts(&[0u8; 8], vec![0u8; 32]),
            Err(CryptoError::InvalidNonceLength(8))
        ));
        assert!(matches!(
            EncryptedSecret::from_parts(&[], vec![0u8; 32]),
            Err(CryptoError::InvalidNonceLength(0))
        ));
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let key = test_key();
        let short = EncryptedSecret::from_parts(&[0u8; NONCE_LEN], vec![0u8; 5]).unwrap();
        assert!(decrypt_secret(&key, &short).is_err());
    }

    #[test]
    fn test_empty_secret_works() {
        let key = test_key();
        let encrypted = encrypt_secret(&key, "").unwrap();
        assert_eq!(encrypted.ciphertext().len(), TAG_LEN);
        assert_eq!(*decrypt_secret(&key, &encrypted).unwrap(), "");
    }
}
