//! PRNG state and generation paths.
//!
//! This module owns the key material and the two ChaCha generators
//! derived from it: a strong path that requires entropy credit and a
//! fast path that does not.

mod csprng;

pub use csprng::{GeneratorError, PrngState};
