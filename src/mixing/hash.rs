//! Hash-based key mixing.
//!
//! Uses standard hash functions to fold arbitrary seed material into
//! a fixed-size key, and to derive independent subkeys from that key.

use blake3::Hasher as Blake3Hasher;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Domain separator for seed mixing.
const MIX_DOMAIN: &[u8] = b"entropy-service-mix-v1";

/// Domain separator for subkey derivation.
const DERIVE_DOMAIN: &[u8] = b"entropy-service-derive-v1";

/// Domain separator for post-generation key ratcheting.
const RATCHET_DOMAIN: &[u8] = b"entropy-service-ratchet-v1";

/// Supported hash algorithms for mixing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 - fast, secure, recommended default.
    #[default]
    Blake3,
    /// SHA-256 - widely deployed, conservative choice.
    Sha256,
}

/// Folds seed material into a 32-byte key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mixer {
    algorithm: HashAlgorithm,
}

impl Mixer {
    /// Creates a new mixer with the specified algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Returns the configured hash algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Mixes `input` into `key`, producing the next key.
    ///
    /// The result is `H(domain || counter || key || len || input)`. The
    /// length prefix keeps `input` from being confused with a longer
    /// input that happens to share a prefix, and the counter makes the
    /// same input mixed twice yield two different keys.
    pub fn mix(&self, key: &[u8; 32], counter: u64, input: &[u8]) -> [u8; 32] {
        let len = input.len() as u64;
        self.digest(&[
            MIX_DOMAIN,
            &counter.to_le_bytes(),
            key,
            &len.to_le_bytes(),
            input,
        ])
    }

    /// Derives a subkey of `key` bound to `context`.
    pub fn derive(&self, key: &[u8; 32], context: &[u8]) -> [u8; 32] {
        self.digest(&[DERIVE_DOMAIN, context, key])
    }

    /// Replaces `key` after output has been drawn from it.
    ///
    /// `output` is fresh generator output that was never handed out, so
    /// the old key cannot be recovered from the new one.
    pub fn ratchet(&self, key: &[u8; 32], output: &[u8; 32]) -> [u8; 32] {
        self.digest(&[RATCHET_DOMAIN, key, output])
    }

    fn digest(&self, parts: &[&[u8]]) -> [u8; 32] {
        match self.algorithm {
            HashAlgorithm::Blake3 => {
                let mut hasher = Blake3Hasher::new();
                for part in parts {
                    hasher.update(part);
                }
                *hasher.finalize().as_bytes()
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                for part in parts {
                    hasher.update(part);
                }
                let result = hasher.finalize();
                let mut data = [0u8; 32];
                data.copy_from_slice(&result);
                data
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_changes_key() {
        let mixer = Mixer::default();
        let key = [0x01u8; 32];

        let next = mixer.mix(&key, 0, b"seed material");
        assert_ne!(next, key);
    }

    #[test]
    fn test_mix_empty_input_still_rekeys() {
        let mixer = Mixer::default();
        let key = [0x01u8; 32];

        assert_ne!(mixer.mix(&key, 0, &[]), key);
    }

    #[test]
    fn test_counter_affects_output() {
        let mixer = Mixer::default();
        let key = [0x01u8; 32];

        assert_ne!(mixer.mix(&key, 0, b"abc"), mixer.mix(&key, 1, b"abc"));
    }

    #[test]
    fn test_algorithms_differ() {
        let key = [0x42u8; 32];
        let blake = Mixer::new(HashAlgorithm::Blake3).mix(&key, 0, b"abc");
        let sha = Mixer::new(HashAlgorithm::Sha256).mix(&key, 0, b"abc");

        assert_ne!(blake, sha);
    }

    #[test]
    fn test_derive_contexts_are_independent() {
        let mixer = Mixer::new(HashAlgorithm::Sha256);
        let key = [0x42u8; 32];

        assert_ne!(mixer.derive(&key, b"strong"), mixer.derive(&key, b"fast"));
        assert_eq!(mixer.derive(&key, b"strong"), mixer.derive(&key, b"strong"));
    }

    #[test]
    fn test_ratchet_differs_from_mix() {
        let mixer = Mixer::default();
        let key = [0x07u8; 32];
        let output = [0x09u8; 32];

        assert_ne!(mixer.ratchet(&key, &output), mixer.mix(&key, 0, &output));
    }

    #[test]
    fn test_algorithm_names_in_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            hash: HashAlgorithm,
        }

        let parsed: Wrapper = toml::from_str("hash = \"sha256\"").unwrap();
        assert_eq!(parsed.hash, HashAlgorithm::Sha256);
    }
}
