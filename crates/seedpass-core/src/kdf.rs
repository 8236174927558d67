//! Seed phrase → vault key derivation
//!
//! PBKDF2-HMAC-SHA256 over the UTF-8 seed phrase with a fixed application
//! salt. The salt and iteration count are format constants: changing either
//! makes every existing vault unreadable.

use std::fmt;

use hmac::Hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::CryptoError;

/// Application salt. Public, not secret, never derived from the seed.
pub const KDF_SALT: &[u8] = b"seedpass-salt";

/// PBKDF2 iteration count
pub const KDF_ITERATIONS: u32 = 100_000;

/// Derived key length (256 bits for AES-256-GCM)
pub const KEY_LEN: usize = 32;

/// 256-bit vault key. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive the vault key for a seed phrase.
///
/// Pure: the same phrase always yields the same key.
pub fn derive_key(seed: &str) -> Result<DerivedKey, CryptoError> {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(seed.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let derived = DerivedKey(key);
    key.zeroize();
    Ok(derived)
}

/// [`derive_key`] on the blocking pool, so the 100k rounds don't stall the
/// async executor.
pub async fn derive_key_async(seed: &str) -> Result<DerivedKey, CryptoError> {
    let seed = Zeroizing::new(seed.to_owned());
    tokio::task::spawn_blocking(move || derive_key(&seed))
        .await
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?
}
