//! SeedPass CLI: site passwords from a seed phrase, plus an encrypted vault
//!
//! The seed phrase is read from `SEEDPASS_SEED` or, if unset, from the first
//! line of stdin. It is never written anywhere.
//!
//! # Usage
//!
//! ```bash
//! seedpass generate --words 12
//! echo "$SEED" | seedpass derive --site example.com --length 20
//! printf '%s\n%s\n' "$SEED" "hunter2" | seedpass save --site example.com
//! seedpass --config seedpass.toml list
//! ```

mod commands;
mod config;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use commands::Command;

fn main() -> Result<()> {
    // Before any seed material is read; reported once the logger is up
    let core_dumps = seedpass_core::memory::disable_core_dumps();

    // Global options come first; everything from the first bare word on is the command
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = std::env::var_os("SEEDPASS_CONFIG").map(PathBuf::from);
    let mut validate_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--validate-config" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("seedpass {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other if other.starts_with('-') => {
                anyhow::bail!("Unknown argument: {}", other);
            }
            _ => break,
        }
        i += 1;
    }

    // Load config
    let mut cfg = match &config_path {
        Some(path) => config::Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::Config::default(),
    };
    cfg.apply_env_overrides();
    cfg.validate().context("Configuration validation failed")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cfg.general.log_level.to_lowercase()),
    )
    .init();

    if let Err(e) = core_dumps {
        log::warn!("Failed to disable core dumps: {}", e);
    }

    if validate_only {
        println!("Configuration is valid.");
        println!("  Database:       {}", cfg.vault.db_path.display());
        println!("  Slot:           {}", cfg.vault.slot);
        println!("  Distinguish:    {}", cfg.vault.distinguish_failures);
        println!("  Serialize:      {}", cfg.vault.serialize_writes);
        println!("  Default length: {}", cfg.derive.default_length);
        println!("  Default words:  {}", cfg.derive.default_words);
        return Ok(());
    }

    let command = Command::parse(&args[i..])?;
    log::debug!("Running {:?}", command);

    let seed_env = std::env::var("SEEDPASS_SEED").ok().map(zeroize::Zeroizing::new);

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    rt.block_on(commands::execute(
        command,
        &cfg,
        seed_env.as_deref().map(String::as_str),
        &mut input,
        &mut out,
    ))?;
    out.flush()?;

    Ok(())
}

fn print_help() {
    println!("{}", USAGE);
}

const USAGE: &str = r#"SeedPass: deterministic site passwords and an encrypted vault

USAGE:
    seedpass [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    generate [--words 12|24]                       Print a new BIP-39 mnemonic
    validate                                       Check the seed phrase
    derive --site <SITE> [--username <U>] [--length <N>]
                                                   Print the password for a site
    save --site <SITE> [--username <U>]            Encrypt the next stdin line and store it
                                                   (the secret must not be empty)
    get --site <SITE>                              Print the stored secret for a site
    list                                           List stored sites (no seed needed)

OPTIONS:
    -c, --config <PATH>   Config file path (TOML)
    --validate-config     Validate configuration and exit
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES:
    SEEDPASS_SEED                  Seed phrase (otherwise read from the first stdin line)
    SEEDPASS_CONFIG                Config file path
    SEEDPASS_DB_PATH               Vault database path
    SEEDPASS_SLOT                  Vault slot name
    SEEDPASS_LOG_LEVEL             Log level (off/error/warn/info/debug/trace)
    SEEDPASS_DEFAULT_LENGTH        Password length when --length is omitted
    SEEDPASS_DISTINGUISH_FAILURES  Report wrong-seed lookups separately (true/false)
    SEEDPASS_SERIALIZE_WRITES      Serialize concurrent saves (true/false)
"#;
