use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

mod config;
mod header_codec;
mod http;
mod metrics;

use chainweb_mining_core::{ChainwebVersion, Supervisor, SystemClock};
use config::WorkerConfig;
use header_codec::ChainwebHeaderCodec;
use http::AppState;
use metrics::WorkerMetrics;

#[derive(Parser, Debug)]
#[command(name = "chainweb-mining-node")]
#[command(about = "Chainweb proof-of-work mining worker", long_about = None)]
#[command(version)]
struct Args {
    /// Run with a single-core, trivially-easy development configuration
    #[arg(long)]
    dev: bool,

    /// Number of mining threads (0 means all available cores)
    #[arg(long)]
    threads: Option<u16>,

    /// Chainweb network version (test, simulation, testnet00)
    #[arg(long)]
    version: Option<String>,

    /// Submit/poll HTTP bridge address
    #[arg(long)]
    http_addr: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if let Some(config_path) = &args.config {
        WorkerConfig::from_file(config_path)?
    } else if args.dev {
        WorkerConfig::development()
    } else {
        WorkerConfig::default()
    };

    // Command-line args override config file values: defaults -> config
    // file -> CLI args.
    if let Some(threads) = args.threads {
        config.cores = threads;
    }
    if let Some(ref version) = args.version {
        config.version = ChainwebVersion::from_text(version)?;
    }
    if let Some(ref http_addr) = args.http_addr {
        config.http_addr = http_addr.clone();
    }

    if config.operational.structured_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env().add_directive(
                    config
                        .operational
                        .log_level
                        .parse()
                        .unwrap_or(tracing::Level::INFO.into()),
                ),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env().add_directive(
                    config
                        .operational
                        .log_level
                        .parse()
                        .unwrap_or(tracing::Level::INFO.into()),
                ),
            )
            .init();
    }

    info!(
        "starting chainweb-mining-node v{}",
        env!("CARGO_PKG_VERSION")
    );
    if args.dev {
        info!("development mode enabled");
    }

    let cores = if config.cores == 0 {
        num_cpus::get() as u16
    } else {
        config.cores
    };
    info!(cores, version = config.version.as_text(), "mining supervisor starting");

    let (supervisor, join) = Supervisor::spawn(
        cores,
        config.version,
        ChainwebHeaderCodec,
        Arc::new(SystemClock),
    );

    let metrics = Arc::new(Mutex::new(WorkerMetrics::new()?));
    metrics.lock().unwrap().mining_active_workers.set(cores as i64);

    if config.operational.enable_metrics {
        tokio::spawn(hash_rate_reporter(supervisor.clone(), metrics.clone()));
    }

    let state = AppState {
        supervisor: supervisor.clone(),
        metrics,
    };

    let http_addr = config.http_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = http::serve(&http_addr, state).await {
            warn!(error = %e, "submit/poll bridge exited with an error");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    supervisor.shutdown();
    tokio::task::spawn_blocking(move || join.join())
        .await?
        .map_err(|_| anyhow::anyhow!("mining supervisor thread panicked"))?;

    Ok(())
}

/// Polls the supervisor's cumulative hash counter on a fixed interval and
/// derives an instantaneous hash rate, plus syncs the job counters (the
/// supervisor only ever increments these, so each tick reports the delta).
async fn hash_rate_reporter(
    supervisor: Supervisor<header_codec::MinedHeader, ChainwebHeaderCodec>,
    metrics: Arc<Mutex<WorkerMetrics>>,
) {
    const INTERVAL: Duration = Duration::from_secs(5);
    let mut last_hashes = supervisor.hashes_computed();
    let mut last_submitted = supervisor.jobs_submitted();
    let mut last_completed = supervisor.jobs_completed();
    let mut last_preempted = supervisor.jobs_preempted();

    loop {
        tokio::time::sleep(INTERVAL).await;

        let hashes = supervisor.hashes_computed();
        let rate = (hashes.saturating_sub(last_hashes)) as f64 / INTERVAL.as_secs_f64();
        last_hashes = hashes;

        let submitted = supervisor.jobs_submitted();
        let completed = supervisor.jobs_completed();
        let preempted = supervisor.jobs_preempted();

        let m = metrics.lock().unwrap();
        m.mining_hash_rate.set(rate);
        m.mining_jobs_submitted_total
            .inc_by(submitted.saturating_sub(last_submitted));
        m.mining_jobs_completed_total
            .inc_by(completed.saturating_sub(last_completed));
        m.mining_jobs_preempted_total
            .inc_by(preempted.saturating_sub(last_preempted));
        drop(m);

        last_submitted = submitted;
        last_completed = completed;
        last_preempted = preempted;
    }
}
