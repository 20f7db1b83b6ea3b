//! Metrics collection and registry.

use crate::service::ServiceStats;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of service state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether strong output is available.
    pub seeded: bool,
    /// Accumulated entropy credit in bits.
    pub credit_bits: f64,
    /// Seeding threshold in bits.
    pub threshold_bits: f64,
    /// Total mixes performed.
    pub mix_count: u64,
    /// Total strong-path bytes.
    pub strong_bytes: u64,
    /// Total fast-path bytes.
    pub pseudo_bytes: u64,
    /// Seed files loaded.
    pub seed_file_loads: u64,
    /// Seed files saved.
    pub seed_file_saves: u64,
}

impl MetricsSnapshot {
    /// Creates a snapshot from service statistics.
    pub fn from_stats(stats: &ServiceStats) -> Self {
        Self {
            seeded: stats.seeded,
            credit_bits: stats.credit_bits,
            threshold_bits: stats.threshold_bits,
            mix_count: stats.mix_count,
            strong_bytes: stats.strong_bytes,
            pseudo_bytes: stats.pseudo_bytes,
            seed_file_loads: stats.seed_file_loads,
            seed_file_saves: stats.seed_file_saves,
        }
    }
}

/// Prometheus metrics registry for the entropy service.
pub struct MetricsRegistry {
    registry: Registry,

    seeded: IntGauge,
    credit_bits: Gauge,
    threshold_bits: Gauge,

    mix_total: IntCounter,
    strong_bytes_total: IntCounter,
    pseudo_bytes_total: IntCounter,

    seed_file_loads_total: IntCounter,
    seed_file_saves_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all service metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let seeded = IntGauge::new(
            "entropy_service_seeded",
            "Seeding status (1=seeded, 0=unseeded)",
        )?;
        let credit_bits = Gauge::new(
            "entropy_service_credit_bits",
            "Entropy credit accumulated, in bits",
        )?;
        let threshold_bits = Gauge::new(
            "entropy_service_threshold_bits",
            "Entropy credit required for strong output, in bits",
        )?;

        let mix_total = IntCounter::new(
            "entropy_service_mix_total",
            "Total seed material mixes performed",
        )?;
        let strong_bytes_total = IntCounter::new(
            "entropy_service_strong_bytes_total",
            "Total bytes produced by the strong generation path",
        )?;
        let pseudo_bytes_total = IntCounter::new(
            "entropy_service_pseudo_bytes_total",
            "Total bytes produced by the fast generation path",
        )?;

        let seed_file_loads_total = IntCounter::new(
            "entropy_service_seed_file_loads_total",
            "Total seed files loaded",
        )?;
        let seed_file_saves_total = IntCounter::new(
            "entropy_service_seed_file_saves_total",
            "Total seed files saved",
        )?;

        registry.register(Box::new(seeded.clone()))?;
        registry.register(Box::new(credit_bits.clone()))?;
        registry.register(Box::new(threshold_bits.clone()))?;
        registry.register(Box::new(mix_total.clone()))?;
        registry.register(Box::new(strong_bytes_total.clone()))?;
        registry.register(Box::new(pseudo_bytes_total.clone()))?;
        registry.register(Box::new(seed_file_loads_total.clone()))?;
        registry.register(Box::new(seed_file_saves_total.clone()))?;

        Ok(Self {
            registry,
            seeded,
            credit_bits,
            threshold_bits,
            mix_total,
            strong_bytes_total,
            pseudo_bytes_total,
            seed_file_loads_total,
            seed_file_saves_total,
        })
    }

    /// Updates all metrics from a snapshot of service state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.seeded.set(if snapshot.seeded { 1 } else { 0 });
        self.credit_bits.set(snapshot.credit_bits);
        self.threshold_bits.set(snapshot.threshold_bits);

        // Counters only move forward, by the difference
        advance(&self.mix_total, snapshot.mix_count);
        advance(&self.strong_bytes_total, snapshot.strong_bytes);
        advance(&self.pseudo_bytes_total, snapshot.pseudo_bytes);
        advance(&self.seed_file_loads_total, snapshot.seed_file_loads);
        advance(&self.seed_file_saves_total, snapshot.seed_file_saves);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}
