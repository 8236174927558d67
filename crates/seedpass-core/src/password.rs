//! Deterministic password synthesis
//!
//! Turns `(seed, site, username, length)` into a printable password without
//! storing anything. The same inputs give the same password forever, so the
//! charset, its order and the hashing scheme are frozen.
//!
//! # Scheme
//!
//! | Step    | Operation                                                      |
//! |---------|----------------------------------------------------------------|
//! | stretch | `SHA-256(seed ‖ site ‖ username ‖ decimal(counter))`, counter = 0, 1, … |
//! | collect | concatenate digests until at least `length` bytes              |
//! | map     | `CHARSET[byte % 78]` for the first `length` bytes              |
//!
//! The inputs are concatenated without separators, so `("ab", "c")` and
//! `("a", "bc")` as site/username collide. That is part of the format.

use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

/// Output alphabet: 26 lowercase, 26 uppercase, 10 digits, 16 symbols
pub const CHARSET: &[u8; 78] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*-_=+;:.?";

/// Shortest password we will synthesize
pub const MIN_LENGTH: usize = 8;

/// Longest password we will synthesize
pub const MAX_LENGTH: usize = 64;

pub const DEFAULT_LENGTH: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Invalid password length {0} (must be {MIN_LENGTH}..={MAX_LENGTH})")]
    InvalidLength(usize),
}

/// Derive the password for a site.
///
/// # Example
/// ```
/// use seedpass_core::password::derive_password;
/// let seed = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
/// let pw = derive_password(seed, "example.com", "", 16).unwrap();
/// assert_eq!(pw, "Zw9JG1JKbhaA?n;$");
/// ```
pub fn derive_password(
    seed: &str,
    site: &str,
    username: &str,
    length: usize,
) -> Result<String, PasswordError> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(PasswordError::InvalidLength(length));
    }

    let mut stretched = Zeroizing::new(Vec::with_capacity(length + 32));
    let mut counter: u64 = 0;
    while stretched.len() < length {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(site.as_bytes());
        hasher.update(username.as_bytes());
        hasher.update(counter.to_string().as_bytes());
        stretched.extend_from_slice(&hasher.finalize());
        counter += 1;
    }

    Ok(stretched[..length]
        .iter()
        .map(|&b| CHARSET[b as usize % CHARSET.len()] as char)
        .collect())
}
