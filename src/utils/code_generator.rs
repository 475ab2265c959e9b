//! Short code generation.
//!
//! Codes are derived from a hash of the owner and URL with a random
//! perturbation, so the same owner/URL pair tends towards the same region of
//! the code space. Collisions are retried with a time-based reseed and, as a
//! last resort, with purely random codes that are checked until unique.

use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;
use rand::rngs::ThreadRng;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::AppError;

/// Default code alphabet: ASCII letters and digits.
pub const DEFAULT_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Default number of characters in a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Hash-seeded attempts before switching to random codes.
const MAX_SEEDED_ATTEMPTS: usize = 10;

/// Random codes tried before walking the code space.
const MAX_RANDOM_ATTEMPTS: usize = 1_000;

/// Upper bound (exclusive) of the random value added to the hash seed.
const SEED_PERTURBATION: u64 = 1_000_000;

/// Generates fixed-length codes over a configured alphabet.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl CodeGenerator {
    /// Creates a generator for codes of `length` characters drawn from `alphabet`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the alphabet has fewer than two
    /// characters, repeats a character, or `length` is zero.
    pub fn new(alphabet: &str, length: usize) -> Result<Self, AppError> {
        let chars: Vec<char> = alphabet.chars().collect();
        let distinct: HashSet<char> = chars.iter().copied().collect();

        if chars.len() < 2 {
            return Err(AppError::bad_request(
                "Code alphabet must contain at least 2 characters",
                json!({ "alphabet": alphabet }),
            ));
        }
        if distinct.len() != chars.len() {
            return Err(AppError::bad_request(
                "Code alphabet must not repeat characters",
                json!({ "alphabet": alphabet }),
            ));
        }
        if length == 0 {
            return Err(AppError::bad_request(
                "Code length must be greater than 0",
                json!({ "length": length }),
            ));
        }

        Ok(Self {
            alphabet: chars,
            length,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct codes, or `None` if it does not fit in a `u128`.
    pub fn capacity(&self) -> Option<u128> {
        let length = u32::try_from(self.length).ok()?;
        (self.alphabet.len() as u128).checked_pow(length)
    }

    /// Produces a code for `owner_id`/`url` that is not in `existing_codes`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CapacityExceeded`] when every possible code is
    /// already taken.
    pub fn generate(
        &self,
        owner_id: &str,
        url: &str,
        existing_codes: &HashSet<String>,
    ) -> Result<String, AppError> {
        let taken = existing_codes
            .iter()
            .filter(|code| self.is_in_space(code))
            .count() as u128;
        if self.capacity().is_some_and(|capacity| taken >= capacity) {
            return Err(AppError::capacity_exceeded(
                "No short codes left for the configured alphabet and length",
                json!({ "taken": taken, "length": self.length }),
            ));
        }

        let mut rng = rand::rng();
        let mut seed_text = format!("{owner_id}{url}");

        for attempt in 1..=MAX_SEEDED_ATTEMPTS {
            let code = self.seeded_code(&seed_text, &mut rng);
            if !existing_codes.contains(&code) {
                return Ok(code);
            }
            debug!(attempt, "Short code collision, reseeding");
            let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
            seed_text = format!("{owner_id}{url}{nanos}");
        }

        warn!(
            attempts = MAX_SEEDED_ATTEMPTS,
            "Seeded short codes kept colliding, falling back to random codes"
        );
        self.fallback_code(existing_codes, &mut rng)
    }

    /// Base-N digit extraction of a hash-derived seed.
    fn seeded_code(&self, seed_text: &str, rng: &mut ThreadRng) -> String {
        let digest = Sha256::digest(seed_text.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);

        let seed = u64::from_be_bytes(head).wrapping_add(rng.random_range(0..SEED_PERTURBATION));
        self.code_at(u128::from(seed))
    }

    fn random_code(&self, rng: &mut ThreadRng) -> String {
        (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect()
    }

    /// Random codes until one is free, then a walk over the code space.
    ///
    /// The walk visits `existing_codes.len() + 1` distinct positions, so it
    /// always finds a free code while the space is not exhausted.
    fn fallback_code(
        &self,
        existing_codes: &HashSet<String>,
        rng: &mut ThreadRng,
    ) -> Result<String, AppError> {
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let doubled = self.random_code(rng) + &self.random_code(rng);
            let code: String = doubled.chars().take(self.length).collect();
            if !existing_codes.contains(&code) {
                return Ok(code);
            }
        }

        let space = self.capacity().unwrap_or(u128::MAX);
        let start = rng.random::<u128>() % space;
        for step in 0..=existing_codes.len() as u128 {
            let code = self.code_at(start.wrapping_add(step) % space);
            if !existing_codes.contains(&code) {
                return Ok(code);
            }
        }

        Err(AppError::capacity_exceeded(
            "No short codes left for the configured alphabet and length",
            json!({ "taken": existing_codes.len(), "length": self.length }),
        ))
    }

    /// The code whose base-N digits (least significant first) spell `index`.
    fn code_at(&self, mut index: u128) -> String {
        let base = self.alphabet.len() as u128;
        let mut code = String::with_capacity(self.length);
        for _ in 0..self.length {
            code.push(self.alphabet[(index % base) as usize]);
            index /= base;
        }
        code
    }

    fn is_in_space(&self, code: &str) -> bool {
        code.chars().count() == self.length && code.chars().all(|c| self.alphabet.contains(&c))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            length: DEFAULT_CODE_LENGTH,
        }
    }
}
