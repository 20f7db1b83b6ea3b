//! Seed mixing and entropy credit accounting.
//!
//! Caller-supplied seed material is folded into the PRNG key through a
//! cryptographic hash, never XORed or appended. Alongside the key, the
//! credit accumulator tracks how many bits of entropy callers have vouched
//! for, which is what decides whether strong output may be produced.

mod credit;
mod hash;

pub use credit::{EntropyCredit, DEFAULT_THRESHOLD_BITS};
pub use hash::{HashAlgorithm, Mixer};
