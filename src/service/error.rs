//! Errors surfaced by the entropy service.

use crate::generator::GeneratorError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during entropy service operations.
///
/// Each kind is kept distinct so callers can tell "seed more material
/// and retry" apart from bad input and from disk trouble.
#[derive(Debug, Error)]
pub enum EntropyError {
    /// Requested byte count is negative or too large.
    #[error("invalid length {0}: byte count must be between 0 and 2147483647")]
    InvalidLength(i64),

    /// Seed file path is malformed.
    #[error("invalid seed file path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path, escaped for display.
        path: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Opening, reading or writing a seed file failed.
    #[error("seed file {}: {source}", .path.display())]
    SeedFile {
        /// The seed file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Strong output was refused: unseeded state or generator fault.
    #[error("strong generation refused: {0}")]
    InsufficientEntropy(#[source] GeneratorError),

    /// The fast path failed.
    #[error("pseudo-random generation failed: {0}")]
    Generation(#[source] GeneratorError),

    /// The OS random source could not be read.
    #[error("OS entropy source unavailable: {0}")]
    OsEntropy(#[source] rand_core::Error),
}

impl EntropyError {
    /// Returns true if seeding more material may let a retry succeed.
    pub fn is_retryable_after_seeding(&self) -> bool {
        matches!(self, Self::InsufficientEntropy(GeneratorError::Unseeded { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unseeded_is_retryable() {
        let unseeded = EntropyError::InsufficientEntropy(GeneratorError::Unseeded {
            have: 0.0,
            need: 256.0,
        });
        assert!(unseeded.is_retryable_after_seeding());
        assert!(!EntropyError::InvalidLength(-1).is_retryable_after_seeding());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = EntropyError::SeedFile {
            path: PathBuf::from("/nonexistent/seed"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/nonexistent/seed"));

        let err = EntropyError::InsufficientEntropy(GeneratorError::Unseeded {
            have: 64.0,
            need: 256.0,
        });
        assert!(err.to_string().contains("have 64.0 bits, need 256.0 bits"));
    }
}
