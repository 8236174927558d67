//! CLI configuration: TOML file plus environment variable overrides
//!
//! Priority: environment variables > config file > defaults.
//! The seed phrase is never read from here.

use anyhow::{Context, Result};
use seedpass_core::password::{MAX_LENGTH, MIN_LENGTH};
use seedpass_core::vault::DEFAULT_SLOT;
use seedpass_core::{VaultOptions, WordCount};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSection,

    /// Vault storage settings
    #[serde(default)]
    pub vault: VaultSection,

    /// Password synthesis defaults
    #[serde(default)]
    pub derive: DeriveSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// SQLite database holding the vault slot
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Slot name inside the database
    #[serde(default = "default_slot")]
    pub slot: String,

    /// Report "could not decrypt" separately from "not found"
    #[serde(default)]
    pub distinguish_failures: bool,

    /// Serialize concurrent saves within one process
    #[serde(default)]
    pub serialize_writes: bool,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            slot: default_slot(),
            distinguish_failures: false,
            serialize_writes: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveSection {
    /// Password length when `--length` is not given
    #[serde(default = "default_length")]
    pub default_length: usize,

    /// Mnemonic size for `generate` when `--words` is not given
    #[serde(default = "default_words")]
    pub default_words: usize,
}

impl Default for DeriveSection {
    fn default() -> Self {
        Self {
            default_length: default_length(),
            default_words: default_words(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("seedpass.db")
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

fn default_length() -> usize {
    seedpass_core::password::DEFAULT_LENGTH
}

fn default_words() -> usize {
    24
}

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

// ============================================================================
// Loading & environment override
// ============================================================================

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `SEEDPASS_DB_PATH`
    /// - `SEEDPASS_SLOT`
    /// - `SEEDPASS_LOG_LEVEL`
    /// - `SEEDPASS_DEFAULT_LENGTH`
    /// - `SEEDPASS_DISTINGUISH_FAILURES`
    /// - `SEEDPASS_SERIALIZE_WRITES`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SEEDPASS_DB_PATH") {
            self.vault.db_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SEEDPASS_SLOT") {
            self.vault.slot = v;
        }
        if let Ok(v) = std::env::var("SEEDPASS_LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Ok(v) = std::env::var("SEEDPASS_DEFAULT_LENGTH") {
            if let Ok(length) = v.parse::<usize>() {
                self.derive.default_length = length;
            }
        }
        if let Ok(v) = std::env::var("SEEDPASS_DISTINGUISH_FAILURES") {
            self.vault.distinguish_failures = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("SEEDPASS_SERIALIZE_WRITES") {
            self.vault.serialize_writes = parse_flag(&v);
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (MIN_LENGTH..=MAX_LENGTH).contains(&self.derive.default_length),
            "derive.default_length must be between {} and {}",
            MIN_LENGTH,
            MAX_LENGTH
        );

        WordCount::try_from(self.derive.default_words)
            .context("derive.default_words must be 12 or 24")?;

        anyhow::ensure!(!self.vault.slot.is_empty(), "vault.slot must not be empty");

        anyhow::ensure!(
            LOG_LEVELS.contains(&self.general.log_level.to_lowercase().as_str()),
            "general.log_level must be one of {}",
            LOG_LEVELS.join("/")
        );

        Ok(())
    }

    /// Vault behavior derived from the `[vault]` section
    pub fn vault_options(&self) -> VaultOptions {
        VaultOptions {
            slot: self.vault.slot.clone(),
            distinguish_failures: self.vault.distinguish_failures,
            serialize_writes: self.vault.serialize_writes,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ============================================================================
// Tests
// ============================================================================
