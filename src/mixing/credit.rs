//! Advisory entropy credit.
//!
//! Callers assert how much entropy their material carries. The estimate
//! is never checked against the bytes themselves; it only moves the
//! generator from unseeded to seeded once enough has been claimed.

/// Credit required before strong output is produced (32 full-entropy bytes).
pub const DEFAULT_THRESHOLD_BITS: f64 = 256.0;

/// Accumulated entropy credit against a seeding threshold.
///
/// Credit only ever grows, so once seeded the accumulator stays seeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyCredit {
    bits: f64,
    threshold_bits: f64,
}

impl EntropyCredit {
    /// Creates an empty accumulator with the given threshold.
    pub fn new(threshold_bits: f64) -> Self {
        Self {
            bits: 0.0,
            threshold_bits,
        }
    }

    /// Adds `bits` of credit. Zero, negative and non-finite estimates
    /// contribute nothing.
    pub fn add(&mut self, bits: f64) {
        if bits.is_finite() && bits > 0.0 {
            self.bits += bits;
        }
    }

    /// Returns true once the credited bits reach the threshold.
    #[inline]
    pub fn is_seeded(&self) -> bool {
        self.bits >= self.threshold_bits
    }

    /// Returns the credited bits.
    #[inline]
    pub fn bits(&self) -> f64 {
        self.bits
    }

    /// Returns the seeding threshold in bits.
    #[inline]
    pub fn threshold_bits(&self) -> f64 {
        self.threshold_bits
    }
}

impl Default for EntropyCredit {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unseeded() {
        let credit = EntropyCredit::default();
        assert!(!credit.is_seeded());
        assert_eq!(credit.bits(), 0.0);
    }

    #[test]
    fn test_seeded_at_threshold() {
        let mut credit = EntropyCredit::new(128.0);

        credit.add(100.0);
        assert!(!credit.is_seeded());

        credit.add(28.0);
        assert!(credit.is_seeded());
    }

    #[test]
    fn test_non_positive_estimates_ignored() {
        let mut credit = EntropyCredit::new(8.0);

        credit.add(0.0);
        credit.add(-64.0);
        credit.add(f64::NAN);
        credit.add(f64::INFINITY);

        assert_eq!(credit.bits(), 0.0);
        assert!(!credit.is_seeded());
    }
}
