//! SeedPass Core
//!
//! Reproducible passwords and an encrypted vault, all from one BIP-39 seed phrase.
//!
//! # Password Synthesis
//!
//! `SHA-256(seed || site || username || counter)` stretched to the requested
//! length and mapped onto a fixed 78-character charset. Stateless.
//!
//! # Encrypted Vault
//!
//! Secrets are encrypted with AES-256-GCM under a key derived from the seed via
//! PBKDF2-HMAC-SHA256, then appended to a single JSON document held in a
//! pluggable [`storage::SecretStore`].

pub mod crypto;
pub mod kdf;
pub mod memory;
pub mod password;
pub mod seed;
pub mod storage;
pub mod vault;

pub use crypto::{decrypt_secret, encrypt_secret, CryptoError, EncryptedSecret};
pub use kdf::{derive_key, derive_key_async, DerivedKey};
pub use password::{derive_password, PasswordError};
pub use seed::*;
pub use storage::{MemoryStore, SecretStore, SqliteStore, StorageError};
pub use vault::{Lookup, VaultEntry, VaultError, VaultOptions, VaultStore};
