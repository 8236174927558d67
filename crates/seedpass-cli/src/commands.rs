//! Subcommand parsing and execution
//!
//! Input (seed phrase, secrets) comes from a `BufRead` and output goes to a
//! `Write`, so the whole flow runs against in-memory buffers in tests.

use anyhow::{Context, Result};
use seedpass_core::{
    derive_password, generate_mnemonic, normalize_seed, parse_mnemonic, SqliteStore, VaultStore,
    WordCount,
};
use std::io::{BufRead, Write};
use zeroize::Zeroizing;

use crate::config::Config;

/// One CLI invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print a fresh mnemonic
    Generate { words: Option<usize> },
    /// Check the session seed
    Validate,
    /// Synthesize a password
    Derive {
        site: String,
        username: String,
        length: Option<usize>,
    },
    /// Encrypt a secret read from input and store it
    Save { site: String, username: String },
    /// Decrypt a stored secret
    Get { site: String },
    /// List stored sites
    List,
}

impl Command {
    /// Parse a subcommand and its flags
    pub fn parse(args: &[String]) -> Result<Self> {
        let (name, rest) = args
            .split_first()
            .context("Missing command (try --help)")?;

        let mut site: Option<String> = None;
        let mut username = String::new();
        let mut length: Option<usize> = None;
        let mut words: Option<usize> = None;

        let mut i = 0;
        while i < rest.len() {
            let flag = rest[i].as_str();
            match flag {
                "--site" | "-s" => site = Some(flag_value(rest, &mut i, flag)?.to_string()),
                "--username" | "-u" => username = flag_value(rest, &mut i, flag)?.to_string(),
                "--length" | "-l" => {
                    length = Some(
                        flag_value(rest, &mut i, flag)?
                            .parse()
                            .context("--length expects a number")?,
                    )
                }
                "--words" | "-w" => {
                    words = Some(
                        flag_value(rest, &mut i, flag)?
                            .parse()
                            .context("--words expects 12 or 24")?,
                    )
                }
                other => anyhow::bail!("Unknown argument for {}: {}", name, other),
            }
            i += 1;
        }

        let require_site = |site: Option<String>| -> Result<String> {
            let site = site.with_context(|| format!("{} requires --site", name))?;
            anyhow::ensure!(!site.is_empty(), "--site must not be empty");
            Ok(site)
        };

        let command = match name.as_str() {
            "generate" => Self::Generate { words },
            "validate" => Self::Validate,
            "derive" => Self::Derive {
                site: require_site(site)?,
                username,
                length,
            },
            "save" => Self::Save {
                site: require_site(site)?,
                username,
            },
            "get" => Self::Get {
                site: require_site(site)?,
            },
            "list" => Self::List,
            other => anyhow::bail!("Unknown command: {}", other),
        };
        Ok(command)
    }

    /// Whether the command needs the seed phrase
    pub fn needs_seed(&self) -> bool {
        !matches!(self, Self::Generate { .. } | Self::List)
    }
}

fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

/// Read one line, without its line ending
fn read_line(input: &mut impl BufRead) -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    input
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Resolve the session seed: `seed_env` if given, otherwise one input line.
///
/// The phrase is normalized and must be a valid 12- or 24-word mnemonic
/// before anything is derived from it.
fn read_seed(seed_env: Option<&str>, input: &mut impl BufRead) -> Result<Zeroizing<String>> {
    let raw = match seed_env {
        Some(seed) => Zeroizing::new(seed.to_string()),
        None => read_line(input)?,
    };
    let seed = Zeroizing::new(normalize_seed(&raw));
    anyhow::ensure!(!seed.is_empty(), "Please enter your seed phrase");
    parse_mnemonic(&seed).context("Invalid seed phrase")?;
    Ok(seed)
}

fn open_vault(config: &Config) -> Result<VaultStore<SqliteStore>> {
    let path = &config.vault.db_path;
    let store = SqliteStore::open(path)
        .with_context(|| format!("Failed to open vault database {}", path.display()))?;
    Ok(VaultStore::with_options(store, config.vault_options()))
}

/// Execute a parsed command.
pub async fn execute(
    command: Command,
    config: &Config,
    seed_env: Option<&str>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let seed = if command.needs_seed() {
        Some(read_seed(seed_env, input)?)
    } else {
        None
    };
    let seed = seed.as_deref().map(String::as_str).unwrap_or_default();

    match command {
        Command::Generate { words } => {
            let count = WordCount::try_from(words.unwrap_or(config.derive.default_words))?;
            let mnemonic = generate_mnemonic(count)?;
            writeln!(out, "{}", mnemonic)?;
        }
        Command::Validate => {
            let words = seed.split(' ').count();
            writeln!(out, "Seed phrase is valid ({} words)", words)?;
        }
        Command::Derive {
            site,
            username,
            length,
        } => {
            let length = length.unwrap_or(config.derive.default_length);
            let password = Zeroizing::new(derive_password(seed, &site, &username, length)?);
            writeln!(out, "{}", *password)?;
        }
        Command::Save { site, username } => {
            let secret = read_line(input)?;
            anyhow::ensure!(!secret.is_empty(), "Secret must not be empty");

            let vault = open_vault(config)?;
            vault
                .save_entry(seed, &site, &username, &secret)
                .await
                .context("Failed to save entry")?;
            log::info!("Saved vault entry");
            writeln!(out, "Saved entry for {}", site)?;
        }
        Command::Get { site } => {
            let vault = open_vault(config)?;
            match vault.get_decrypted_password(seed, &site).await? {
                Some(secret) => writeln!(out, "{}", *secret)?,
                // Absent may also mean a wrong seed
                None => anyhow::bail!("No password available for {}", site),
            }
        }
        Command::List => {
            let vault = open_vault(config)?;
            let sites = vault.list_sites().await?;
            if sites.is_empty() {
                writeln!(out, "Vault is empty")?;
            }
            for (site, username) in sites {
                if username.is_empty() {
                    writeln!(out, "{}", site)?;
                } else {
                    writeln!(out, "{}\t{}", site, username)?;
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
