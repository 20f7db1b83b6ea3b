//! Entropy Service Library
//!
//! A process-wide CSPRNG facade with explicit seeding, entropy credit
//! tracking, and seed file persistence.
//!
//! # Architecture
//!
//! ```text
//! mixing → generator → service → metrics
//!    ↑                    ↑
//!          config
//! ```
//!
//! # Design Principles
//!
//! - **Fail-closed**: Strong output is refused until enough entropy is credited
//! - **Distinct failures**: Bad input, missing entropy and I/O errors never collapse
//! - **Uses standard primitives**: BLAKE3/SHA-256 for mixing, ChaCha for generation
//! - **Advisory estimates**: Entropy credit is bookkeeping, not measurement
//!
//! # Example
//!
//! ```no_run
//! use entropy_service::{EntropyService, ServiceConfig};
//!
//! let service = EntropyService::new(ServiceConfig::default());
//! assert!(!service.status());
//!
//! service.seed(&[0x42u8; 32]);
//! service.add_entropy(&[0x17u8; 64], 256.0);
//! assert!(service.status());
//!
//! let key = service.generate_bytes(16).unwrap();
//! assert_eq!(key.len(), 16);
//!
//! service.save_seed_file("/var/lib/entropy/seed").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod generator;
pub mod metrics;
pub mod mixing;
pub mod service;

// Re-export commonly used types at crate root
pub use config::{ConfigError, DaemonConfig, FileConfig, ServiceConfig};
pub use generator::{GeneratorError, PrngState};
pub use mixing::{EntropyCredit, HashAlgorithm, Mixer};
pub use service::{EntropyError, EntropyService, ServiceStats, MAX_REQUEST_BYTES};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
