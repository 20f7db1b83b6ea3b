//! Entropy Service CLI
//!
//! Command-line interface for generating random bytes and maintaining
//! a persistent seed file.

use chrono::Utc;
use clap::{Parser, Subcommand};
use entropy_service::{DaemonConfig, EntropyService, FileConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "entropy-service", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed file loaded at startup and rewritten on exit.
    #[arg(long, global = true)]
    seed_file: Option<PathBuf>,

    /// Do not credit OS entropy at startup.
    #[arg(long, global = true)]
    no_os_seed: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report whether the generator is seeded.
    Status,
    /// Print random bytes.
    Generate {
        /// Number of bytes.
        #[arg(allow_negative_numbers = true)]
        count: i64,
        /// Use the fast path (not suitable for secrets).
        #[arg(long)]
        pseudo: bool,
        /// Write raw bytes instead of hex.
        #[arg(long)]
        raw: bool,
    },
    /// Write a new seed file.
    WriteSeedFile {
        /// Destination path.
        path: PathBuf,
    },
    /// Keep the seed file fresh until interrupted.
    Daemon,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file_config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let FileConfig {
        service: service_config,
        daemon: mut daemon_config,
    } = file_config;

    if cli.seed_file.is_some() {
        daemon_config.seed_file = cli.seed_file.clone();
    }

    info!("Entropy Service v{}", entropy_service::VERSION);

    let service = Arc::new(EntropyService::try_new(service_config)?);

    if !cli.no_os_seed {
        service.poll_os_entropy()?;
    }

    if let Some(path) = &daemon_config.seed_file {
        load_if_present(&service, path);
    }

    match cli.command {
        Command::Status => {
            let stats = service.stats();
            println!("seeded: {}", service.status());
            println!(
                "credit: {:.1} / {:.1} bits",
                stats.credit_bits, stats.threshold_bits
            );
            println!("mixes: {}", stats.mix_count);
            if let Some(at) = stats.last_mixed_at {
                println!("last mixed: {}", at.to_rfc3339());
            }
        }
        Command::Generate { count, pseudo, raw } => {
            let bytes = if pseudo {
                service.generate_pseudo_bytes(count)?
            } else {
                service.generate_bytes(count)?
            };

            let mut stdout = std::io::stdout().lock();
            if raw {
                stdout.write_all(&bytes)?;
            } else {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                writeln!(stdout, "{}", hex)?;
            }
            stdout.flush()?;
        }
        Command::WriteSeedFile { path } => {
            service.save_seed_file(path_str(&path)?)?;
        }
        Command::Daemon => {
            return run_daemon(&service, &daemon_config);
        }
    }

    // Leave a fresh seed behind for the next run
    if let Some(path) = &daemon_config.seed_file {
        service.save_seed_file(path_str(path)?)?;
    }

    Ok(())
}

fn run_daemon(
    service: &Arc<EntropyService>,
    config: &DaemonConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    if config.metrics_port != 0 {
        spawn_metrics_server(Arc::clone(service), config.metrics_port)?;
    }

    let reseed_every = Duration::from_secs(config.reseed_interval_secs);
    let save_every = Duration::from_secs(config.save_interval_secs);
    let mut last_reseed = Instant::now();
    let mut last_save = Instant::now();

    info!(
        reseed_interval_secs = config.reseed_interval_secs,
        save_interval_secs = config.save_interval_secs,
        "Daemon running, press Ctrl-C to stop"
    );

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(250));

        if last_reseed.elapsed() >= reseed_every {
            if let Err(e) = service.poll_os_entropy() {
                warn!("OS entropy poll failed: {}", e);
            }
            last_reseed = Instant::now();
        }

        if last_save.elapsed() >= save_every {
            if let Some(path) = &config.seed_file {
                save_logged(service, path);
                let next = Utc::now() + chrono::Duration::seconds(config.save_interval_secs as i64);
                info!(next_save = %next.to_rfc3339(), "Seed file refreshed");
            }
            last_save = Instant::now();
        }
    }

    info!("Shutting down");
    if let Some(path) = &config.seed_file {
        save_logged(service, path);
    }

    Ok(())
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(
    service: Arc<EntropyService>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    use entropy_service::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    let registry = MetricsRegistry::new()?;
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry, service);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });

    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(
    _service: Arc<EntropyService>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(port, "Built without the metrics feature, not serving metrics");
    Ok(())
}

fn load_if_present(service: &EntropyService, path: &Path) {
    if !path.exists() {
        info!(path = %path.display(), "No seed file yet");
        return;
    }

    match path_str(path).map(|p| service.load_seed_file(p)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to load seed file: {}", e),
        Err(e) => warn!("Unusable seed file path: {}", e),
    }
}

fn save_logged(service: &EntropyService, path: &Path) {
    let result = path_str(path).and_then(|p| Ok(service.save_seed_file(p)?));
    if let Err(e) = result {
        warn!("Failed to save seed file: {}", e);
    }
}

fn path_str(path: &Path) -> Result<&str, Box<dyn std::error::Error>> {
    path.to_str()
        .ok_or_else(|| format!("path {} is not valid UTF-8", path.display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use entropy_service::EntropyError;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("entropy-service").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_count_is_invalid_length() {
        let err = run(parse(&["--no-os-seed", "generate", "-1"])).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EntropyError>(),
            Some(EntropyError::InvalidLength(-1))
        ));
    }

    #[test]
    fn test_strong_generate_needs_seeding() {
        let err = run(parse(&["--no-os-seed", "generate", "16"])).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EntropyError>(),
            Some(EntropyError::InsufficientEntropy(_))
        ));
    }

    #[test]
    fn test_generate_rewrites_seed_file() {
        let dir = TempDir::new().unwrap();
        let seed = dir.path().join("seed");
        let seed = seed.to_str().unwrap();

        run(parse(&["--seed-file", seed, "generate", "0"])).unwrap();
        assert_eq!(std::fs::read(seed).unwrap().len(), 1024);
    }

    #[test]
    fn test_config_file_errors_surface() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("entropy.toml");
        std::fs::write(&config, "[service]\nseed_threshold_bits = -1.0\n").unwrap();

        let err = run(parse(&["--config", config.to_str().unwrap(), "status"])).unwrap_err();
        assert!(err.to_string().contains("invalid seed threshold"));
    }
}
