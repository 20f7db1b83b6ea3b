//! The process-wide entropy service.

use super::{seed_file, EntropyError};
use crate::config::{ConfigError, ServiceConfig};
use crate::generator::PrngState;
use chrono::{DateTime, Utc};
use rand_core::RngCore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Bytes drawn from the OS by [`EntropyService::poll_os_entropy`].
const OS_POLL_BYTES: usize = 32;

/// Largest single generation request, in bytes.
pub const MAX_REQUEST_BYTES: i64 = i32::MAX as i64;

static GLOBAL: OnceLock<EntropyService> = OnceLock::new();

/// Point-in-time view of the service for reporting.
#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    /// Whether strong output is currently available.
    pub seeded: bool,
    /// Entropy credit accumulated so far, in bits.
    pub credit_bits: f64,
    /// Credit required to become seeded, in bits.
    pub threshold_bits: f64,
    /// Mixes performed.
    pub mix_count: u64,
    /// Bytes produced by the strong path.
    pub strong_bytes: u64,
    /// Bytes produced by the fast path.
    pub pseudo_bytes: u64,
    /// Seed files successfully loaded.
    pub seed_file_loads: u64,
    /// Seed files successfully saved.
    pub seed_file_saves: u64,
    /// When material was last mixed in.
    pub last_mixed_at: Option<DateTime<Utc>>,
    /// When a seed file was last saved.
    pub last_saved_at: Option<DateTime<Utc>>,
}

/// Mutable state guarded by the service lock.
struct Inner {
    prng: PrngState,
    seed_file_loads: u64,
    seed_file_saves: u64,
    last_mixed_at: Option<DateTime<Utc>>,
    last_saved_at: Option<DateTime<Utc>>,
}

/// Thread-safe facade over a single PRNG state.
///
/// All operations that touch the state serialize on one internal lock.
/// [`status`](Self::status) reads an atomic mirror of the seeded flag
/// and never blocks. Seed file I/O runs outside the lock; only the mix
/// or snapshot step is serialized.
///
/// Construct independent instances with [`EntropyService::new`] and
/// share one through an `Arc`, or use [`EntropyService::global`] for the
/// single process-wide instance.
pub struct EntropyService {
    config: ServiceConfig,
    inner: Mutex<Inner>,
    seeded: AtomicBool,
}

impl EntropyService {
    /// Creates a service after validating `config`.
    pub fn try_new(config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Creates a service from a configuration the caller has already
    /// validated.
    ///
    /// The generators are keyed from the OS entropy source, but that
    /// material carries no credit: with a positive threshold, strong
    /// output stays unavailable until callers seed the service.
    pub fn new(config: ServiceConfig) -> Self {
        let prng = PrngState::from_os_entropy(config.hash, config.seed_threshold_bits);

        tracing::debug!(
            hash = ?config.hash,
            threshold_bits = config.seed_threshold_bits,
            "Entropy service created"
        );

        let seeded = AtomicBool::new(prng.is_seeded());

        Self {
            config,
            inner: Mutex::new(Inner {
                prng,
                seed_file_loads: 0,
                seed_file_saves: 0,
                last_mixed_at: None,
                last_saved_at: None,
            }),
            seeded,
        }
    }

    /// Returns the process-wide service, constructing it on first use.
    ///
    /// The global instance uses the default configuration and lives
    /// until process exit. There is exactly one per process.
    pub fn global() -> &'static EntropyService {
        GLOBAL.get_or_init(|| EntropyService::new(ServiceConfig::default()))
    }

    /// Returns the configuration this service was built with.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Mixes `data` into the state, fully trusted as entropy.
    ///
    /// Credits eight bits per byte. Empty input is accepted and still
    /// advances the key. Returns `data` unchanged.
    pub fn seed<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        self.mix(data, data.len() as f64 * 8.0);
        data
    }

    /// Mixes `data` into the state with a caller-asserted entropy estimate.
    ///
    /// The estimate is advisory: it is never checked against the data,
    /// and zero or negative estimates simply add no credit.
    pub fn add_entropy(&self, data: &[u8], estimated_bits: f64) {
        self.mix(data, estimated_bits);
    }

    /// Mixes fresh OS randomness into the state, credited in full.
    pub fn poll_os_entropy(&self) -> Result<(), EntropyError> {
        let mut data = [0u8; OS_POLL_BYTES];
        rand_core::OsRng
            .try_fill_bytes(&mut data)
            .map_err(EntropyError::OsEntropy)?;

        self.mix(&data, (OS_POLL_BYTES * 8) as f64);
        tracing::debug!(bytes = OS_POLL_BYTES, "Polled OS entropy");
        Ok(())
    }

    /// Reads the seed file at `path` and mixes its contents in as with
    /// [`seed`](Self::seed).
    ///
    /// The state is untouched unless the whole read succeeds.
    pub fn load_seed_file(&self, path: &str) -> Result<(), EntropyError> {
        let path = seed_file::validate_path(path)?;
        let data = seed_file::read(path.clone(), self.config.max_load_bytes)?;

        let mut inner = self.lock();
        Self::mix_locked(&mut inner, &data, data.len() as f64 * 8.0);
        inner.seed_file_loads += 1;
        self.publish_status(&inner);
        drop(inner);

        tracing::info!(path = %path.display(), bytes = data.len(), "Loaded seed file");
        Ok(())
    }

    /// Writes fresh seed material to `path`, creating or truncating it.
    ///
    /// Saving is allowed while unseeded; the file then carries whatever
    /// the state holds, which is logged as a warning.
    pub fn save_seed_file(&self, path: &str) -> Result<(), EntropyError> {
        let path = seed_file::validate_path(path)?;

        let (material, seeded) = {
            let mut inner = self.lock();
            let material = inner
                .prng
                .snapshot(self.config.seed_file_bytes)
                .map_err(EntropyError::Generation)?;
            (material, inner.prng.is_seeded())
        };

        if !seeded {
            tracing::warn!(path = %path.display(), "Saving seed file from unseeded state");
        }

        seed_file::write(path.clone(), &material)?;

        let mut inner = self.lock();
        inner.seed_file_saves += 1;
        inner.last_saved_at = Some(Utc::now());
        drop(inner);

        tracing::info!(path = %path.display(), bytes = material.len(), "Saved seed file");
        Ok(())
    }

    /// Returns `n` bytes from the strong path.
    ///
    /// `n == 0` returns an empty vector without consulting the generator.
    /// Seeding is checked on every call under the lock, not taken from
    /// [`status`](Self::status).
    pub fn generate_bytes(&self, n: i64) -> Result<Vec<u8>, EntropyError> {
        let len = checked_len(n)?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; len];
        self.lock()
            .prng
            .fill_strong(&mut buf)
            .map_err(EntropyError::InsufficientEntropy)?;

        tracing::trace!(bytes = len, "Generated strong bytes");
        Ok(buf)
    }

    /// Returns `n` bytes from the fast path.
    ///
    /// Available while unseeded. Not suitable for keys or other secrets.
    pub fn generate_pseudo_bytes(&self, n: i64) -> Result<Vec<u8>, EntropyError> {
        let len = checked_len(n)?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; len];
        self.lock()
            .prng
            .fill_pseudo(&mut buf)
            .map_err(EntropyError::Generation)?;

        tracing::trace!(bytes = len, "Generated pseudo-random bytes");
        Ok(buf)
    }

    /// Returns true if enough entropy has been credited for strong output.
    pub fn status(&self) -> bool {
        self.seeded.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the service counters.
    pub fn stats(&self) -> ServiceStats {
        let inner = self.lock();
        let credit = inner.prng.credit();

        ServiceStats {
            seeded: credit.is_seeded(),
            credit_bits: credit.bits(),
            threshold_bits: credit.threshold_bits(),
            mix_count: inner.prng.mix_count(),
            strong_bytes: inner.prng.strong_bytes(),
            pseudo_bytes: inner.prng.pseudo_bytes(),
            seed_file_loads: inner.seed_file_loads,
            seed_file_saves: inner.seed_file_saves,
            last_mixed_at: inner.last_mixed_at,
            last_saved_at: inner.last_saved_at,
        }
    }

    fn mix(&self, data: &[u8], credit_bits: f64) {
        let mut inner = self.lock();
        Self::mix_locked(&mut inner, data, credit_bits);
        self.publish_status(&inner);
    }

    fn mix_locked(inner: &mut Inner, data: &[u8], credit_bits: f64) {
        inner.prng.mix(data, credit_bits);
        inner.last_mixed_at = Some(Utc::now());
    }

    /// Mirrors the seeded flag for lock-free [`status`](Self::status) reads.
    fn publish_status(&self, inner: &Inner) {
        if inner.prng.is_seeded() {
            self.seeded.store(true, Ordering::Release);
        }
    }

    // PrngState commits each mix and fill only after all fallible work,
    // so a poisoned lock still guards a consistent state.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EntropyService {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl std::fmt::Debug for EntropyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyService")
            .field("config", &self.config)
            .field("seeded", &self.status())
            .finish_non_exhaustive()
    }
}

fn checked_len(n: i64) -> Result<usize, EntropyError> {
    if n > MAX_REQUEST_BYTES {
        return Err(EntropyError::InvalidLength(n));
    }
    usize::try_from(n).map_err(|_| EntropyError::InvalidLength(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorError;
    use tempfile::TempDir;

    fn path_str(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_str().unwrap().to_owned()
    }

    #[test]
    fn test_starts_unseeded() {
        let service = EntropyService::default();
        assert!(!service.status());
        assert_eq!(service.stats().credit_bits, 0.0);
    }

    #[test]
    fn test_seed_returns_input() {
        let service = EntropyService::default();
        let data = b"caller chosen bytes";

        assert_eq!(service.seed(data), data);
        assert_eq!(service.stats().mix_count, 1);
    }

    #[test]
    fn test_seed_empty_is_accepted() {
        let service = EntropyService::default();

        assert!(service.seed(&[]).is_empty());
        assert_eq!(service.stats().mix_count, 1);
        assert!(!service.status());
    }

    #[test]
    fn test_seed_credits_full_entropy() {
        let service = EntropyService::default();

        service.seed(&[0x42u8; 16]);
        assert_eq!(service.stats().credit_bits, 128.0);
        assert!(!service.status());

        service.seed(&[0x43u8; 16]);
        assert!(service.status());
    }

    #[test]
    fn test_add_entropy_is_advisory() {
        let service = EntropyService::default();

        service.add_entropy(&[0u8; 64], 0.0);
        service.add_entropy(&[0u8; 64], -10.0);
        assert!(!service.status());

        service.add_entropy(&[0u8; 1], 256.0);
        assert!(service.status());
    }

    #[test]
    fn test_negative_lengths_rejected() {
        let service = EntropyService::default();
        service.seed(&[0x01; 32]);

        assert!(matches!(
            service.generate_bytes(-1),
            Err(EntropyError::InvalidLength(-1))
        ));
        assert!(matches!(
            service.generate_pseudo_bytes(i64::MIN),
            Err(EntropyError::InvalidLength(i64::MIN))
        ));
    }

    #[test]
    fn test_oversized_lengths_rejected() {
        let service = EntropyService::default();
        service.seed(&[0x01; 32]);

        assert!(matches!(
            service.generate_bytes(i64::MAX),
            Err(EntropyError::InvalidLength(i64::MAX))
        ));
        assert!(matches!(
            service.generate_pseudo_bytes(i64::MAX),
            Err(EntropyError::InvalidLength(i64::MAX))
        ));
        assert!(matches!(
            service.generate_pseudo_bytes(MAX_REQUEST_BYTES + 1),
            Err(EntropyError::InvalidLength(_))
        ));
        assert_eq!(service.stats().strong_bytes, 0);
        assert_eq!(service.stats().pseudo_bytes, 0);
    }

    #[test]
    fn test_status_matches_state_at_construction() {
        let service = EntropyService::new(ServiceConfig {
            seed_threshold_bits: 0.0,
            ..Default::default()
        });

        assert_eq!(service.status(), service.generate_bytes(16).is_ok());
        assert!(service.status());
    }

    #[test]
    fn test_try_new_validates_config() {
        let result = EntropyService::try_new(ServiceConfig {
            seed_threshold_bits: 0.0,
            ..Default::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidThreshold(_))));

        let service = EntropyService::try_new(ServiceConfig::default()).unwrap();
        assert!(!service.status());
    }

    #[test]
    fn test_zero_length_never_fails() {
        let service = EntropyService::default();

        assert!(service.generate_bytes(0).unwrap().is_empty());
        assert!(service.generate_pseudo_bytes(0).unwrap().is_empty());
        assert_eq!(service.stats().strong_bytes, 0);
    }

    #[test]
    fn test_strong_requires_seeding() {
        let service = EntropyService::default();

        let err = service.generate_bytes(16).unwrap_err();
        assert!(matches!(
            err,
            EntropyError::InsufficientEntropy(GeneratorError::Unseeded { .. })
        ));
        assert!(err.is_retryable_after_seeding());

        service.seed(&[0x7Fu8; 32]);
        assert_eq!(service.generate_bytes(16).unwrap().len(), 16);
    }

    #[test]
    fn test_pseudo_available_unseeded() {
        let service = EntropyService::default();
        assert_eq!(service.generate_pseudo_bytes(100).unwrap().len(), 100);
    }

    #[test]
    fn test_poll_os_entropy_seeds() {
        let service = EntropyService::default();
        service.poll_os_entropy().unwrap();

        assert!(service.status());
        assert_eq!(service.stats().credit_bits, 256.0);
    }

    #[test]
    fn test_load_missing_file_leaves_state() {
        let dir = TempDir::new().unwrap();
        let service = EntropyService::default();
        let before = service.stats();

        let result = service.load_seed_file(&path_str(&dir, "missing"));
        assert!(matches!(result, Err(EntropyError::SeedFile { .. })));

        let after = service.stats();
        assert_eq!(after.mix_count, before.mix_count);
        assert_eq!(after.credit_bits, before.credit_bits);
        assert_eq!(after.seed_file_loads, 0);
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let service = EntropyService::default();

        assert!(matches!(
            service.load_seed_file("seed\0file"),
            Err(EntropyError::InvalidPath { .. })
        ));
        assert!(matches!(
            service.save_seed_file(""),
            Err(EntropyError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_save_then_load_seeds_fresh_instance() {
        let dir = TempDir::new().unwrap();
        let path = path_str(&dir, "seed");

        let original = EntropyService::default();
        original.seed(&[0x11u8; 32]);
        original.save_seed_file(&path).unwrap();
        assert_eq!(original.stats().seed_file_saves, 1);
        assert!(original.stats().last_saved_at.is_some());

        let fresh = EntropyService::default();
        fresh.load_seed_file(&path).unwrap();

        let stats = fresh.stats();
        assert_eq!(stats.credit_bits, 1024.0 * 8.0);
        assert_eq!(stats.seed_file_loads, 1);
        assert!(fresh.status());
    }

    #[test]
    fn test_load_limit_caps_credit() {
        let dir = TempDir::new().unwrap();
        let path = path_str(&dir, "seed");
        EntropyService::default().save_seed_file(&path).unwrap();

        let service = EntropyService::new(ServiceConfig {
            max_load_bytes: Some(16),
            ..Default::default()
        });
        service.load_seed_file(&path).unwrap();

        assert_eq!(service.stats().credit_bits, 128.0);
        assert!(!service.status());
    }

    #[test]
    fn test_successive_outputs_differ() {
        let service = EntropyService::default();
        service.seed(&[0x33u8; 32]);

        let first = service.generate_bytes(16).unwrap();
        let second = service.generate_bytes(16).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_global_is_singleton() {
        let a = EntropyService::global() as *const EntropyService;
        let b = EntropyService::global() as *const EntropyService;
        assert_eq!(a, b);
    }
}
