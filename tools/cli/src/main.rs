//! Spicerack CLI - Command line interface for password hashing and secret encryption.
//!
//! This tool exposes the spicerack primitives so that peppers and keys can be
//! generated, passwords hashed and verified, and configuration secrets
//! encrypted from a shell.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;
use zeroize::Zeroizing;

use spicerack_common::Error;
use spicerack_crypto::{
    generate_base64_spice, CredentialHasher, PasswordHasher, SecretConfig, SymmetricCipher,
    DEFAULT_SPICE_SIZE,
};

#[derive(Parser)]
#[command(name = "spicerack")]
#[command(about = "Spicerack - Password hashing and secret encryption")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file holding a base64 "pepper" and "key".
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate random base64 spice for use as a pepper or key.
    Spice {
        /// Number of random bytes.
        #[arg(short, long, default_value_t = DEFAULT_SPICE_SIZE)]
        size: usize,
    },

    /// Hash a password read from the terminal.
    Hash {
        /// Base64 pepper (overrides the configuration file).
        #[arg(long, env = "SPICERACK_PEPPER", hide_env_values = true)]
        pepper: Option<String>,
    },

    /// Verify a password read from the terminal against a stored hash.
    Verify {
        /// Stored hash to check against.
        #[arg(long)]
        hash: String,

        /// Base64 pepper (overrides the configuration file).
        #[arg(long, env = "SPICERACK_PEPPER", hide_env_values = true)]
        pepper: Option<String>,
    },

    /// Encrypt text into a base64 payload.
    Encrypt {
        /// Base64 key of 16, 24 or 32 bytes (overrides the configuration file).
        #[arg(short, long, env = "SPICERACK_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Text to encrypt (default: stdin, without its trailing newline).
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Decrypt a base64 payload into text.
    Decrypt {
        /// Base64 key of 16, 24 or 32 bytes (overrides the configuration file).
        #[arg(short, long, env = "SPICERACK_KEY", hide_env_values = true)]
        key: Option<String>,

        /// Payload produced by `encrypt`.
        #[arg(short, long)]
        payload: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Spice { size } => cmd_spice(size),

        Commands::Hash { pepper } => cmd_hash(&resolve_hasher(pepper, &config)?),

        Commands::Verify { hash, pepper } => cmd_verify(&resolve_hasher(pepper, &config)?, &hash),

        Commands::Encrypt { key, text } => cmd_encrypt(&resolve_cipher(key, &config)?, text),

        Commands::Decrypt { key, payload } => {
            cmd_decrypt(&resolve_cipher(key, &config)?, &payload)
        }
    }
}

/// Load the configuration file, or an empty configuration when none is given.
fn load_config(path: Option<&Path>) -> Result<SecretConfig> {
    match path {
        Some(path) => {
            debug!("Using configuration at {}", path.display());
            SecretConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(SecretConfig::default()),
    }
}

/// Build the hasher from an explicit pepper, falling back to the configuration.
fn resolve_hasher(pepper: Option<String>, config: &SecretConfig) -> Result<PasswordHasher> {
    let pepper = pepper.map(Zeroizing::new);
    match pepper {
        Some(pepper) => PasswordHasher::from_base64_pepper(&pepper).context("Invalid pepper"),
        None => config
            .hasher()
            .context("Invalid pepper in configuration"),
    }
}

/// Build the cipher from an explicit key, falling back to the configuration.
fn resolve_cipher(key: Option<String>, config: &SecretConfig) -> Result<SymmetricCipher> {
    let key = key.map(Zeroizing::new);
    match key {
        Some(key) => SymmetricCipher::from_base64_key(&key).context("Invalid key"),
        None => config
            .cipher()
            .context("No usable key; pass --key, set SPICERACK_KEY, or use --config"),
    }
}

/// Prompt for password securely.
fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(Zeroizing::new(password))
}

fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Attach context that tells corrupted stored data apart from other failures.
fn with_failure_context(err: Error, corrupted: &str, failed: &str) -> anyhow::Error {
    let context = if err.is_data_integrity() {
        corrupted
    } else {
        failed
    };
    let context = context.to_string();
    anyhow::Error::new(err).context(context)
}

/// Print fresh base64 spice.
fn cmd_spice(size: usize) -> Result<ExitCode> {
    let spice = generate_base64_spice(size).context("Failed to generate spice")?;
    println!("{}", spice);
    Ok(ExitCode::SUCCESS)
}

/// Hash a password.
fn cmd_hash(hasher: &PasswordHasher) -> Result<ExitCode> {
    info!(peppered = hasher.has_pepper(), "Hashing password");

    let password = prompt_password("Enter password: ")?;
    let confirm = prompt_password("Confirm password: ")?;

    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let hashed = hasher.hash(&password).context("Failed to hash password")?;
    println!("{}", hashed);

    Ok(ExitCode::SUCCESS)
}

/// Verify a password against a stored hash.
fn cmd_verify(hasher: &PasswordHasher, hash: &str) -> Result<ExitCode> {
    info!(peppered = hasher.has_pepper(), "Verifying password");

    let password = prompt_password("Enter password: ")?;
    let matched = hasher.verify(&password, hash).map_err(|err| {
        with_failure_context(err, "Stored hash is corrupted", "Failed to verify password")
    })?;

    if matched {
        println!("Password matches.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Password does not match.");
        Ok(ExitCode::FAILURE)
    }
}

/// Encrypt text from the command line or stdin.
fn cmd_encrypt(cipher: &SymmetricCipher, text: Option<String>) -> Result<ExitCode> {
    let text = match text {
        Some(text) => Zeroizing::new(text),
        None => {
            let mut input = Zeroizing::new(String::new());
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read plaintext from stdin")?;
            input
        }
    };

    let payload = cipher
        .encrypt_string(strip_trailing_newline(&text))
        .context("Failed to encrypt")?;
    println!("{}", payload);

    Ok(ExitCode::SUCCESS)
}

/// Decrypt a payload and print the text.
fn cmd_decrypt(cipher: &SymmetricCipher, payload: &str) -> Result<ExitCode> {
    let plaintext = Zeroizing::new(cipher.decrypt_string(payload).map_err(|err| {
        with_failure_context(
            err,
            "Payload is corrupted or was encrypted with another key",
            "Failed to decrypt",
        )
    })?);
    println!("{}", plaintext.as_str());

    Ok(ExitCode::SUCCESS)
}
