//! The entropy service and its seed file persistence.
//!
//! [`EntropyService`] is the only owner of PRNG state in the crate. It
//! validates every caller-supplied length and path, serializes access
//! to the state, and reports failures as distinct [`EntropyError`]
//! kinds.

mod entropy;
mod error;
mod seed_file;

pub use entropy::{EntropyService, ServiceStats, MAX_REQUEST_BYTES};
pub use error::EntropyError;
