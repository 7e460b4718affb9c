//! Hash-based ID generation.
//!
//! Record identifiers are opaque strings of the form `{kind}-{hash}` where the
//! hash is the first eight bytes of a SHA256 digest rendered as 12 base36
//! characters (e.g. `iss-0k3v9q2m1xzd`). Each generator remembers the IDs it has
//! handed out or been told about and retries with a nonce on collision.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Length of the hash part of every generated ID.
pub const HASH_LENGTH: usize = 12;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce produced an ID that is already taken
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried.
        attempts: u32,
    },

    /// Invalid length parameter
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// The record type an ID is minted for; selects the ID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// Issue records.
    Issue,
    /// Comments embedded in issues.
    Comment,
    /// Category records.
    Category,
    /// Project records.
    Project,
    /// User records.
    User,
}

impl IdKind {
    /// Prefix placed before the hash.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Issue => "iss",
            Self::Comment => "cmt",
            Self::Category => "cat",
            Self::Project => "prj",
            Self::User => "usr",
        }
    }
}

/// Hash-based ID generator with collision detection
///
/// The set of known IDs grows with every registered or generated ID, roughly
/// one short string per record held by the owning storage.
#[derive(Debug, Default)]
pub struct IdGenerator {
    existing_ids: HashSet<String>,
    sequence: u64,
}

impl IdGenerator {
    /// Create an empty generator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.existing_ids.insert(id.into());
    }

    /// Generate a new unique ID for `kind`, mixing `seed` (usually a name or
    /// comment body) into the hash.
    ///
    /// # Errors
    ///
    /// Returns an error if unable to generate a unique ID after trying all nonces.
    pub fn generate(&mut self, kind: IdKind, seed: &str) -> Result<String, IdGenerationError> {
        self.sequence = self.sequence.wrapping_add(1);

        for nonce in 0..MAX_NONCE {
            let id = self.generate_hash_id(kind, seed, nonce)?;

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, kind = kind.prefix(), "Generated unique ID after collision retries");
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    fn generate_hash_id(
        &self,
        kind: IdKind,
        seed: &str,
        nonce: u32,
    ) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!(
            "{}|{}|{}|{}|{}",
            kind.prefix(),
            seed,
            timestamp,
            self.sequence,
            nonce
        );

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        let hash_str = encode_base36(&hash_bytes[..8], HASH_LENGTH)?;
        Ok(format!("{}-{}", kind.prefix(), hash_str))
    }
}

/// Encode up to eight bytes as a fixed-width base36 string.
///
/// Leading positions are zero-padded when the value is small.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut num: u64 = 0;
    for &byte in bytes {
        num = num.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        let remainder = usize::try_from(num % 36).unwrap_or_default();
        result.push(char::from(BASE36_CHARS[remainder]));
        num /= 36;
    }

    Ok(result.into_iter().rev().collect())
}

/// Check that `id` looks like an ID minted for `kind`.
#[must_use]
pub fn validate_id(id: &str, kind: IdKind) -> bool {
    let Some(hash) = id
        .strip_prefix(kind.prefix())
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    hash.len() == HASH_LENGTH && hash.bytes().all(|b| BASE36_CHARS.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36_encoding() {
        let result = encode_base36(&[0x12, 0x34, 0x56, 0x78], 6).unwrap();
        assert_eq!(result.len(), 6);
        assert!(result.bytes().all(|b| BASE36_CHARS.contains(&b)));
    }

    #[test]
    fn test_base36_zero_pads() {
        assert_eq!(encode_base36(&[0], 4).unwrap(), "0000");
        assert_eq!(encode_base36(&[35], 3).unwrap(), "00z");
        assert_eq!(encode_base36(&[36], 3).unwrap(), "010");
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            encode_base36(&[1], 0),
            Err(IdGenerationError::InvalidLength)
        ));
    }

    #[test]
    fn test_generated_ids_have_kind_prefix() {
        let mut generator = IdGenerator::new();
        let id = generator.generate(IdKind::Issue, "Crash on save").unwrap();
        assert!(id.starts_with("iss-"));
        assert!(validate_id(&id, IdKind::Issue));
        assert!(!validate_id(&id, IdKind::User));
    }

    #[test]
    fn test_same_seed_yields_distinct_ids() {
        let mut generator = IdGenerator::new();
        let ids: HashSet<String> = (0..500)
            .map(|_| generator.generate(IdKind::Comment, "same").unwrap())
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_registered_ids_are_avoided() {
        let mut generator = IdGenerator::new();
        let id = generator.generate(IdKind::User, "alice").unwrap();

        let mut other = IdGenerator::new();
        other.register_id(id.clone());
        for _ in 0..50 {
            assert_ne!(other.generate(IdKind::User, "alice").unwrap(), id);
        }
    }

    #[test]
    fn test_validate_id_rejects_bad_shapes() {
        assert!(!validate_id("iss-short", IdKind::Issue));
        assert!(!validate_id("iss-ABCDEFGHIJKL", IdKind::Issue));
        assert!(!validate_id("iss0123456789ab", IdKind::Issue));
        assert!(validate_id("iss-0123456789ab", IdKind::Issue));
    }
}
