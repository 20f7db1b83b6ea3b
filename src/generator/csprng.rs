//! ChaCha-based PRNG state with hash mixing.
//!
//! # State Model
//!
//! A 32-byte key is the only long-lived secret. Two generators are keyed
//! from it through domain-separated derivation:
//! - ChaCha20 for the strong path, gated on entropy credit
//! - ChaCha8 for the fast path, never gated
//!
//! Every mix replaces the key with `H(domain || counter || key || input)`
//! and rekeys both generators, so input can only add to what an attacker
//! has to guess. After each strong generation the key is ratcheted with
//! unreleased generator output.

use crate::mixing::{EntropyCredit, HashAlgorithm, Mixer};
use rand_chacha::{ChaCha20Rng, ChaCha8Rng};
use rand_core::{RngCore, SeedableRng};
use thiserror::Error;

const STRONG_CONTEXT: &[u8] = b"strong";
const FAST_CONTEXT: &[u8] = b"fast";

/// Errors reported by the generation paths.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Credit is below the seeding threshold.
    #[error("insufficient entropy: have {have:.1} bits, need {need:.1} bits")]
    Unseeded {
        /// Credited bits.
        have: f64,
        /// Threshold in bits.
        need: f64,
    },
    /// The underlying ChaCha generator reported a fault.
    #[error("generator failure: {0}")]
    Primitive(#[from] rand_core::Error),
}

/// The PRNG state: key, generators and entropy bookkeeping.
///
/// The key is never exposed. Material derived from it leaves only
/// through the generation paths and [`PrngState::snapshot`].
pub struct PrngState {
    mixer: Mixer,
    /// Current key. This is NOT the ChaCha seed of either generator.
    key: [u8; 32],
    strong: ChaCha20Rng,
    fast: ChaCha8Rng,
    credit: EntropyCredit,
    /// Mixes performed, folded into each mix.
    mix_count: u64,
    strong_bytes: u64,
    pseudo_bytes: u64,
}

impl PrngState {
    /// Creates a state keyed from the OS entropy source.
    ///
    /// The OS material is not credited: the state starts unseeded and
    /// only caller-supplied credit moves it to seeded.
    pub fn from_os_entropy(algorithm: HashAlgorithm, threshold_bits: f64) -> Self {
        let mut key = [0u8; 32];
        rand_core::OsRng.fill_bytes(&mut key);
        Self::with_key(Mixer::new(algorithm), key, EntropyCredit::new(threshold_bits))
    }

    /// Creates a state from a known key (for testing only).
    #[cfg(test)]
    pub(crate) fn from_key_for_testing(key: [u8; 32], threshold_bits: f64) -> Self {
        Self::with_key(Mixer::default(), key, EntropyCredit::new(threshold_bits))
    }

    fn with_key(mixer: Mixer, key: [u8; 32], credit: EntropyCredit) -> Self {
        Self {
            strong: ChaCha20Rng::from_seed(mixer.derive(&key, STRONG_CONTEXT)),
            fast: ChaCha8Rng::from_seed(mixer.derive(&key, FAST_CONTEXT)),
            mixer,
            key,
            credit,
            mix_count: 0,
            strong_bytes: 0,
            pseudo_bytes: 0,
        }
    }

    /// Mixes `data` into the key and credits `credit_bits` toward seeding.
    ///
    /// Empty input still advances the key.
    pub fn mix(&mut self, data: &[u8], credit_bits: f64) {
        let was_seeded = self.credit.is_seeded();

        let key = self.mixer.mix(&self.key, self.mix_count, data);
        self.rekey(key);
        self.mix_count += 1;
        self.credit.add(credit_bits);

        tracing::trace!(
            bytes = data.len(),
            credit_bits,
            mix_count = self.mix_count,
            "Mixed seed material"
        );

        if !was_seeded && self.credit.is_seeded() {
            tracing::info!(
                credit_bits = self.credit.bits(),
                threshold_bits = self.credit.threshold_bits(),
                "PRNG state became seeded"
            );
        }
    }

    /// Fills `dest` from the strong path.
    ///
    /// Fails with [`GeneratorError::Unseeded`] while credit is below the
    /// threshold. Nothing changes unless the whole fill succeeds.
    pub fn fill_strong(&mut self, dest: &mut [u8]) -> Result<(), GeneratorError> {
        if !self.credit.is_seeded() {
            return Err(GeneratorError::Unseeded {
                have: self.credit.bits(),
                need: self.credit.threshold_bits(),
            });
        }

        self.fill_and_ratchet(dest)?;
        self.strong_bytes += dest.len() as u64;
        Ok(())
    }

    /// Fills `dest` from the fast path. Not gated on entropy credit.
    pub fn fill_pseudo(&mut self, dest: &mut [u8]) -> Result<(), GeneratorError> {
        let mut rng = self.fast.clone();
        rng.try_fill_bytes(dest)?;

        self.fast = rng;
        self.pseudo_bytes += dest.len() as u64;
        Ok(())
    }

    /// Produces `len` bytes of seed material for persistence.
    ///
    /// Bypasses the credit gate: persisting whatever the state holds is
    /// allowed while unseeded. The key is ratcheted afterwards so the
    /// snapshot never reappears as output.
    pub fn snapshot(&mut self, len: usize) -> Result<Vec<u8>, GeneratorError> {
        let mut material = vec![0u8; len];
        self.fill_and_ratchet(&mut material)?;
        Ok(material)
    }

    fn fill_and_ratchet(&mut self, dest: &mut [u8]) -> Result<(), GeneratorError> {
        let mut rng = self.strong.clone();
        rng.try_fill_bytes(dest)?;

        let mut next = [0u8; 32];
        rng.try_fill_bytes(&mut next)?;

        let key = self.mixer.ratchet(&self.key, &next);
        self.rekey(key);
        Ok(())
    }

    fn rekey(&mut self, key: [u8; 32]) {
        self.strong = ChaCha20Rng::from_seed(self.mixer.derive(&key, STRONG_CONTEXT));
        self.fast = ChaCha8Rng::from_seed(self.mixer.derive(&key, FAST_CONTEXT));
        self.key = key;
    }

    /// Returns true if enough entropy has been credited for strong output.
    #[inline]
    pub fn is_seeded(&self) -> bool {
        self.credit.is_seeded()
    }

    /// Returns the entropy credit accumulator.
    pub fn credit(&self) -> &EntropyCredit {
        &self.credit
    }

    /// Returns the number of mixes performed.
    pub fn mix_count(&self) -> u64 {
        self.mix_count
    }

    /// Returns total bytes produced by the strong path.
    pub fn strong_bytes(&self) -> u64 {
        self.strong_bytes
    }

    /// Returns total bytes produced by the fast path.
    pub fn pseudo_bytes(&self) -> u64 {
        self.pseudo_bytes
    }

    /// Returns the mixing hash algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.mixer.algorithm()
    }
}

impl std::fmt::Debug for PrngState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrngState")
            .field("credit", &self.credit)
            .field("mix_count", &self.mix_count)
            .finish_non_exhaustive()
    }
}
