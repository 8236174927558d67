//! Encrypted vault of site secrets
//!
//! The vault is one JSON array of [`VaultEntry`] objects stored in a single
//! slot of a [`SecretStore`]. Saving loads the whole array, appends, and
//! writes the whole array back.
//!
//! # Behavior worth knowing
//!
//! - **First match wins.** Site labels are not unique; lookups return the
//!   earliest saved entry for a site.
//! - **Corruption reads as empty.** [`VaultStore::load_entries`] turns an
//!   unparseable document into an empty vault, and the next save overwrites
//!   it. [`VaultStore::try_load_entries`] reports it instead.
//! - **"Absent" is ambiguous.** [`VaultStore::get_decrypted_password`]
//!   returns `None` both for an unknown site and for an entry that fails to
//!   decrypt. Use [`VaultStore::lookup`] or
//!   [`VaultOptions::distinguish_failures`] to tell them apart.
//! - **Saves race.** Two concurrent saves both read the same document and the
//!   later write drops the earlier entry, unless
//!   [`VaultOptions::serialize_writes`] is set.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use crate::crypto::{decrypt_secret, encrypt_secret, CryptoError, EncryptedSecret};
use crate::kdf::derive_key_async;
use crate::storage::{SecretStore, StorageError};

/// Slot the vault document lives in unless configured otherwise
pub const DEFAULT_SLOT: &str = "seedpass-entries";

/// Errors from vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Vault document is corrupted: {0}")]
    Corrupted(String),

    #[error("Failed to serialize vault: {0}")]
    Serialize(String),

    #[error("Stored secret for {site:?} could not be decrypted")]
    DecryptionFailed { site: String },
}

/// One stored secret, exactly as persisted.
///
/// `ciphertext` and `iv` are standard base64 (with padding). They are kept
/// encoded so that one damaged entry does not make the whole document
/// unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    pub site: String,
    pub username: String,
    /// AES-256-GCM output including the tag
    pub ciphertext: String,
    /// 96-bit nonce
    pub iv: String,
}

impl VaultEntry {
    fn seal(site: &str, username: &str, encrypted: &EncryptedSecret) -> Self {
        Self {
            site: site.to_string(),
            username: username.to_string(),
            ciphertext: STANDARD.encode(encrypted.ciphertext()),
            iv: STANDARD.encode(encrypted.nonce()),
        }
    }

    /// Decode the stored fields back into an [`EncryptedSecret`]
    pub fn encrypted(&self) -> Result<EncryptedSecret, CryptoError> {
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| CryptoError::InvalidEncoding(format!("ciphertext: {}", e)))?;
        let nonce = STANDARD
            .decode(&self.iv)
            .map_err(|e| CryptoError::InvalidEncoding(format!("iv: {}", e)))?;
        EncryptedSecret::from_parts(&nonce, ciphertext)
    }
}

/// Parse a persisted vault document.
///
/// An empty string is an empty vault; anything that is not a JSON array of
/// entries is [`VaultError::Corrupted`].
pub fn parse_document(raw: &str) -> Result<Vec<VaultEntry>, VaultError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| VaultError::Corrupted(e.to_string()))
}

/// Result of a tagged lookup
#[derive(PartialEq, Eq)]
pub enum Lookup {
    /// The first entry for the site decrypted cleanly
    Found(Zeroizing<String>),
    /// No entry has this site label
    NotFound,
    /// An entry exists but did not authenticate under this seed
    DecryptionFailed,
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_) => f.write_str("Found(<redacted>)"),
            Self::NotFound => f.write_str("NotFound"),
            Self::DecryptionFailed => f.write_str("DecryptionFailed"),
        }
    }
}

/// Vault behavior switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultOptions {
    /// Slot name in the backing store
    pub slot: String,
    /// Report decryption failures from `get_decrypted_password` as
    /// [`VaultError::DecryptionFailed`] instead of `None`
    pub distinguish_failures: bool,
    /// Hold a lock across load → append → write so concurrent saves through
    /// the same `VaultStore` cannot drop each other's entries
    pub serialize_writes: bool,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            slot: DEFAULT_SLOT.to_string(),
            distinguish_failures: false,
            serialize_writes: false,
        }
    }
}

/// Encrypted vault over a [`SecretStore`]
///
/// Every operation that touches a key runs PBKDF2 through
/// [`derive_key_async`], which uses `tokio::task::spawn_blocking`. The futures
/// must therefore be polled inside a tokio runtime (any flavor); polling them
/// elsewhere panics. [`SecretStore`] itself does not depend on an executor.
///
/// # Example
/// ```
/// use seedpass_core::{MemoryStore, VaultStore};
///
/// let seed = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
/// let rt = tokio::runtime::Builder::new_current_thread()
///     .enable_all()
///     .build()
///     .unwrap();
/// rt.block_on(async {
///     let vault = VaultStore::new(MemoryStore::new());
///     vault.save_entry(seed, "example.com", "", "hunter2").await.unwrap();
///     let secret = vault.get_decrypted_password(seed, "example.com").await.unwrap();
///     assert_eq!(secret.as_deref().map(String::as_str), Some("hunter2"));
/// });
/// ```
pub struct VaultStore<S> {
    store: S,
    options: VaultOptions,
    write_lock: Mutex<()>,
}

impl<S: SecretStore> VaultStore<S> {
    /// Vault with default options
    pub fn new(store: S) -> Self {
        Self::with_options(store, VaultOptions::default())
    }

    pub fn with_options(store: S, options: VaultOptions) -> Self {
        Self {
            store,
            options,
            write_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &VaultOptions {
        &self.options
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypt `secret` under the seed's key and append it to the vault.
    ///
    /// Key derivation and encryption errors propagate. With default options
    /// the read-modify-write is not atomic.
    pub async fn save_entry(
        &self,
        seed: &str,
        site: &str,
        username: &str,
        secret: &str,
    ) -> Result<(), VaultError> {
        let key = derive_key_async(seed).await?;
        let encrypted = encrypt_secret(&key, secret)?;
        let entry = VaultEntry::seal(site, username, &encrypted);

        let _guard = if self.options.serialize_writes {
            Some(self.write_lock.lock().await)
        } else {
            None
        };

        let mut entries = self.load_entries().await?;
        entries.push(entry);

        let document =
            serde_json::to_string(&entries).map_err(|e| VaultError::Serialize(e.to_string()))?;
        self.store.set(&self.options.slot, &document).await?;

        log::debug!(
            "Wrote vault slot {:?} ({} entries)",
            self.options.slot,
            entries.len()
        );
        Ok(())
    }

    /// All entries in insertion order.
    ///
    /// A missing, empty or unparseable document yields an empty vault.
    /// Only backend failures are errors.
    pub async fn load_entries(&self) -> Result<Vec<VaultEntry>, VaultError> {
        match self.try_load_entries().await {
            Err(VaultError::Corrupted(reason)) => {
                log::warn!(
                    "Vault slot {:?} is corrupted, treating as empty: {}",
                    self.options.slot,
                    reason
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Like [`load_entries`](Self::load_entries) but reports a corrupted
    /// document as [`VaultError::Corrupted`].
    pub async fn try_load_entries(&self) -> Result<Vec<VaultEntry>, VaultError> {
        let raw = self.store.get(&self.options.slot).await?;
        let entries = match raw {
            Some(raw) => parse_document(&raw)?,
            None => Vec::new(),
        };
        log::debug!(
            "Read vault slot {:?} ({} entries)",
            self.options.slot,
            entries.len()
        );
        Ok(entries)
    }

    /// `(site, username)` for every entry, in insertion order. Nothing is
    /// decrypted.
    pub async fn list_sites(&self) -> Result<Vec<(String, String)>, VaultError> {
        Ok(self
            .load_entries()
            .await?
            .into_iter()
            .map(|e| (e.site, e.username))
            .collect())
    }

    /// Find and decrypt the first entry for `site`, keeping "not found" and
    /// "failed to decrypt" apart.
    pub async fn lookup(&self, seed: &str, site: &str) -> Result<Lookup, VaultError> {
        let entries = self.load_entries().await?;
        let Some(entry) = entries.into_iter().find(|e| e.site == site) else {
            return Ok(Lookup::NotFound);
        };

        let key = derive_key_async(seed).await?;
        match entry
            .encrypted()
            .and_then(|encrypted| decrypt_secret(&key, &encrypted))
        {
            Ok(secret) => Ok(Lookup::Found(secret)),
            Err(e) => {
                log::debug!("Entry in slot {:?} did not decrypt: {}", self.options.slot, e);
                Ok(Lookup::DecryptionFailed)
            }
        }
    }

    /// Decrypt the first entry for `site`.
    ///
    /// `None` means "not available": either no such site, or (unless
    /// `distinguish_failures` is set) the entry did not decrypt under this
    /// seed. Callers must not read `None` as "never saved".
    pub async fn get_decrypted_password(
        &self,
        seed: &str,
        site: &str,
    ) -> Result<Option<Zeroizing<String>>, VaultError> {
        match self.lookup(seed, site).await? {
            Lookup::Found(secret) => Ok(Some(secret)),
            Lookup::NotFound => Ok(None),
            Lookup::DecryptionFailed if self.options.distinguish_failures => {
                Err(VaultError::DecryptionFailed {
                    site: site.to_string(),
                })
            }
            Lookup::DecryptionFailed => Ok(None),
        }
    }
}
