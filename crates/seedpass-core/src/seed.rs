//! BIP-39 seed phrase handling
//!
//! Generates and validates the master seed phrase. Everything downstream
//! (key derivation, password synthesis, the vault) treats a validated phrase
//! as an opaque string and never re-validates it.

use bip39::{Language, Mnemonic};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Unsupported word count: {0} (expected 12 or 24)")]
    WordCount(usize),
}

/// Seed phrase lengths accepted by SeedPass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordCount {
    /// 128 bits of entropy
    Twelve,
    /// 256 bits of entropy
    #[default]
    TwentyFour,
}

impl WordCount {
    /// Number of words in the phrase
    pub fn words(&self) -> usize {
        match self {
            Self::Twelve => 12,
            Self::TwentyFour => 24,
        }
    }
}

impl TryFrom<usize> for WordCount {
    type Error = SeedError;

    fn try_from(words: usize) -> Result<Self, Self::Error> {
        match words {
            12 => Ok(Self::Twelve),
            24 => Ok(Self::TwentyFour),
            other => Err(SeedError::WordCount(other)),
        }
    }
}

/// Generate a new English BIP-39 mnemonic
pub fn generate_mnemonic(count: WordCount) -> Result<Mnemonic, SeedError> {
    Mnemonic::generate_in(Language::English, count.words())
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Parse a mnemonic from words.
///
/// Checks the wordlist and checksum, and additionally restricts the phrase
/// to 12 or 24 words.
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, SeedError> {
    let mnemonic = Mnemonic::parse_in(Language::English, words)
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))?;
    WordCount::try_from(mnemonic.word_count())?;
    Ok(mnemonic)
}

/// Whether `phrase` is a usable seed phrase
pub fn validate_seed(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// Clean up typed or pasted input into canonical seed form.
///
/// Lowercases every word, drops anything that is not `a-z`, and joins the
/// remaining words with single spaces. Derivation is byte-exact, so the
/// phrase must go through this before it reaches the KDF.
pub fn normalize_seed(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(|c| {
                    let c = c.to_ascii_lowercase();
                    c.is_ascii_lowercase().then_some(c)
                })
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
