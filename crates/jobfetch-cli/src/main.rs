#![doc = include_str!("../README.md")]

mod config;
mod server;
mod telemetry;

use anyhow::{Context, bail};
use clap::Parser;
use config::{CliArgs, Command, GenerateArgs, ServeConfig, ValidateArgs};
use jobfetch::{CancellationToken, JobDataset, RunConfig};
use std::time::Instant;
use telemetry::{init_telemetry, record_run, shutdown_telemetry};
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    let providers = init_telemetry()?;

    let res = match args.command {
        Command::Fetch(args) => fetch(RunConfig::try_from(args)?).await,
        Command::Serve(args) => server::serve(ServeConfig::try_from(args)?, shutdown_signal()).await,
        Command::Generate(args) => generate(args).await,
        Command::Validate(args) => validate(args).await,
    };

    shutdown_telemetry(providers);
    res
}

async fn fetch(config: RunConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Sending {} requests to {} (timeout {:?})",
        config.num_requests,
        config.base_url,
        config.request_timeout
    );

    // Ctrl+C stops new requests; whatever was harvested is still written.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::warn!("Cancelling run, pending requests will be skipped");
        on_signal.cancel();
    });

    let start = Instant::now();
    let results = jobfetch::run_with_cancellation(&config, cancel)
        .await
        .with_context(|| format!("run against {} failed", config.base_url))?;
    let elapsed = start.elapsed();

    let stats = results.stats();
    record_run(stats, elapsed);

    tracing::info!(
        "Collected {}/{} identifiers into {} ({} misses, {} failures, {} cancelled)",
        stats.harvested,
        stats.requested,
        config.output_file.display(),
        stats.misses,
        stats.failures,
        stats.cancelled
    );
    tracing::info!("Time elapsed to send requests: {:.4}s", elapsed.as_secs_f64());
    Ok(())
}

async fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let dataset = JobDataset::generate(args.max_jobs);
    dataset.save(&args.input_file).await?;
    tracing::info!(
        "Wrote {} jobs to {}",
        dataset.len(),
        args.input_file.display()
    );
    Ok(())
}

async fn validate(args: ValidateArgs) -> anyhow::Result<()> {
    let report = jobfetch::validate_files(&args.output_file, &args.input_file).await?;

    if report.is_match() {
        tracing::info!("SUCCESS: data successfully fetched from server");
        return Ok(());
    }

    tracing::error!(
        "FAILED: {} identifiers missing, {} unexpected",
        report.missing.len(),
        report.unexpected.len()
    );
    for id in report.missing.iter().take(10) {
        tracing::debug!("missing: {id}");
    }
    for id in report.unexpected.iter().take(10) {
        tracing::debug!("unexpected: {id}");
    }
    bail!(
        "{} does not match {}",
        args.output_file.display(),
        args.input_file.display()
    )
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
