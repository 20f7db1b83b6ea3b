//! Prometheus metrics exporter for the entropy service.
//!
//! # Metrics Exposed
//!
//! ## Seeding
//! - `entropy_service_seeded` - Seeding status (1=seeded, 0=unseeded)
//! - `entropy_service_credit_bits` - Entropy credit accumulated
//! - `entropy_service_threshold_bits` - Credit required for strong output
//!
//! ## Generation
//! - `entropy_service_mix_total` - Seed material mixes performed
//! - `entropy_service_strong_bytes_total` - Strong-path bytes produced
//! - `entropy_service_pseudo_bytes_total` - Fast-path bytes produced
//!
//! ## Seed Files
//! - `entropy_service_seed_file_loads_total` - Seed files loaded
//! - `entropy_service_seed_file_saves_total` - Seed files saved
//!
//! # Example
//!
//! ```no_run
//! use entropy_service::metrics::{MetricsRegistry, MetricsSnapshot};
//! use entropy_service::EntropyService;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let service = EntropyService::default();
//!
//! registry.update(&MetricsSnapshot::from_stats(&service.stats()));
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
