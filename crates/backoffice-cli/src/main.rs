//! backoffice-cleanup: deletes expired files from object storage and
//! soft-deletes their records.
//!
//! Configuration comes from the environment (see `backoffice_core::Config`).
//! By default the worker runs until Ctrl+C or SIGTERM; `--once` runs a single
//! batch and exits.

use anyhow::Context;
use backoffice_cli::{setup_database, shutdown_signal};
use backoffice_core::Config;
use backoffice_db::FileRepository;
use backoffice_infra::{init_telemetry, shutdown_telemetry, CleanupService, CleanupWorker};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "backoffice-cleanup", about = "Expired-file cleanup worker")]
struct Cli {
    /// Run a single cleanup batch and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    init_telemetry(config.log_format())
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    let result = run(&config, cli.once).await;
    if let Err(ref e) = result {
        tracing::error!(error = %e, "Cleanup worker exited with error");
    }

    shutdown_telemetry().await;
    result
}

async fn run(config: &Config, once: bool) -> anyhow::Result<()> {
    let pool = setup_database(config).await?;
    let storage = backoffice_storage::create_storage(config)
        .await
        .context("Failed to create storage backend")?;
    let repository = Arc::new(FileRepository::new(pool.clone()));

    match repository.count_expired_pending().await {
        Ok(pending) => tracing::info!(
            pending,
            environment = %config.environment(),
            storage_backend = %storage.backend_type(),
            "Expired files awaiting cleanup"
        ),
        Err(e) => tracing::warn!(error = %e, "Failed to count expired files"),
    }

    let service = Arc::new(CleanupService::new(
        repository,
        storage,
        config.cleanup().clone(),
    )?);

    if once {
        let result = service.cleanup_batch().await?;
        tracing::info!(
            processed = result.processed,
            failed = result.failed,
            "Cleanup batch completed"
        );
        pool.close().await;
        return Ok(());
    }

    if !config.cleanup().enabled {
        tracing::warn!("FILE_CLEANUP_ENABLED=false, not starting cleanup worker");
        pool.close().await;
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let worker = CleanupWorker::new(service);
    worker.start(shutdown.clone());

    shutdown_signal().await;
    tracing::info!("Shutting down gracefully...");
    shutdown.cancel();
    worker.stop().await;

    pool.close().await;
    Ok(())
}
