//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before any command
//! touches the link store. Every variable is optional.
//!
//! ```bash
//! export STORAGE_DIR="data"
//! export LINKS_FILE="user_links.json"
//! export BASE_URL="clck.ru/"
//! export DEFAULT_TTL_HOURS="24"
//! ```
//!
//! ## Variables
//!
//! - `STORAGE_DIR` - Directory holding the data file (default: `data`)
//! - `LINKS_FILE` - Data file name inside `STORAGE_DIR` (default: `user_links.json`)
//! - `BASE_URL` - Prefix of every short URL (default: `clck.ru/`)
//! - `DEFAULT_TTL_HOURS` - Link lifetime in hours (default: 24, range: 1..=87600)
//! - `CODE_LENGTH` - Characters per short code (default: 6, range: 4..=32)
//! - `CODE_ALPHABET` - Characters codes are drawn from (default: `A-Za-z0-9`)
//! - `SWEEP_INTERVAL_MINUTES` - Expiry sweep period (default: 5, range: 1..=10080)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//!
//! Numeric values that fail to parse fall back to their defaults; parsed
//! values outside the allowed range are rejected by [`Config::validate`].

use anyhow::Result;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use crate::utils::code_generator::{DEFAULT_ALPHABET, DEFAULT_CODE_LENGTH};

const MAX_TTL_HOURS: i64 = 87_600;
const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 32;
const MAX_SWEEP_INTERVAL_MINUTES: u64 = 10_080;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub links_file: String,
    /// Prepended verbatim to a code to form the public short URL.
    pub base_url: String,
    pub default_ttl_hours: i64,
    pub code_length: usize,
    pub code_alphabet: String,
    pub sweep_interval_minutes: u64,
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Currently never fails: every variable has a default.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);
        let links_file = env::var("LINKS_FILE").unwrap_or(defaults.links_file);
        let base_url = env::var("BASE_URL").unwrap_or(defaults.base_url);
        let code_alphabet = env::var("CODE_ALPHABET").unwrap_or(defaults.code_alphabet);
        let log_level = env::var("RUST_LOG").unwrap_or(defaults.log_level);
        let log_format = env::var("LOG_FORMAT").unwrap_or(defaults.log_format);

        let default_ttl_hours = env::var("DEFAULT_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_ttl_hours);

        let code_length = env::var("CODE_LENGTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.code_length);

        let sweep_interval_minutes = env::var("SWEEP_INTERVAL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.sweep_interval_minutes);

        Ok(Self {
            storage_dir,
            links_file,
            base_url,
            default_ttl_hours,
            code_length,
            code_alphabet,
            sweep_interval_minutes,
            log_level,
            log_format,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `links_file` is empty or contains a path separator
    /// - `base_url` is empty
    /// - `default_ttl_hours` is outside `1..=87600`
    /// - `code_length` is outside `4..=32`
    /// - `code_alphabet` has fewer than 2 characters or repeats one
    /// - `sweep_interval_minutes` is outside `1..=10080`
    /// - `log_format` is not `text` or `json`
    pub fn validate(&self) -> Result<()> {
        if self.links_file.trim().is_empty() {
            anyhow::bail!("LINKS_FILE must not be empty");
        }

        if self.links_file.contains(['/', '\\']) {
            anyhow::bail!(
                "LINKS_FILE must be a file name, not a path, got '{}'",
                self.links_file
            );
        }

        if self.base_url.is_empty() {
            anyhow::bail!("BASE_URL must not be empty");
        }

        if !(1..=MAX_TTL_HOURS).contains(&self.default_ttl_hours) {
            anyhow::bail!(
                "DEFAULT_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TTL_HOURS,
                self.default_ttl_hours
            );
        }

        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length) {
            anyhow::bail!(
                "CODE_LENGTH must be between {} and {}, got {}",
                MIN_CODE_LENGTH,
                MAX_CODE_LENGTH,
                self.code_length
            );
        }

        let chars: Vec<char> = self.code_alphabet.chars().collect();
        if chars.len() < 2 {
            anyhow::bail!(
                "CODE_ALPHABET must contain at least 2 characters, got '{}'",
                self.code_alphabet
            );
        }
        if chars.iter().collect::<HashSet<_>>().len() != chars.len() {
            anyhow::bail!(
                "CODE_ALPHABET must not repeat characters, got '{}'",
                self.code_alphabet
            );
        }

        if !(1..=MAX_SWEEP_INTERVAL_MINUTES).contains(&self.sweep_interval_minutes) {
            anyhow::bail!(
                "SWEEP_INTERVAL_MINUTES must be between 1 and {}, got {}",
                MAX_SWEEP_INTERVAL_MINUTES,
                self.sweep_interval_minutes
            );
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        Ok(())
    }

    /// Full path of the JSON data file.
    pub fn links_path(&self) -> PathBuf {
        self.storage_dir.join(&self.links_file)
    }

    /// Lifetime given to newly created links.
    pub fn default_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.default_ttl_hours)
    }

    /// Period of the background expiry sweep.
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }

    /// Prints configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Data file: {}", self.links_path().display());
        tracing::info!("  Base URL: {}", self.base_url);
        tracing::info!("  Default TTL: {}h", self.default_ttl_hours);
        tracing::info!(
            "  Codes: {} chars from {} symbols",
            self.code_length,
            self.code_alphabet.chars().count()
        );
        tracing::info!("  Sweep interval: {}m", self.sweep_interval_minutes);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("data"),
            links_file: "user_links.json".to_string(),
            base_url: "clck.ru/".to_string(),
            default_ttl_hours: 24,
            code_length: DEFAULT_CODE_LENGTH,
            code_alphabet: DEFAULT_ALPHABET.to_string(),
            sweep_interval_minutes: 5,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
