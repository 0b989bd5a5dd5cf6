use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetchzip_core::{
    load_config, validate_config, ArchiveOperator, ArchiveWriter, Fetcher, HttpFetcher,
    InMemoryJobStore, JobStore, ZipArchiveWriter,
};
use fetchzip_server::api::create_router;
use fetchzip_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("FETCHZIP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Limits: {} jobs at once, {} files per job",
        config.operator.max_jobs_processing, config.operator.max_files_per_job
    );
    info!("Supported content types: {:?}", config.fetcher.supported_types);

    // Prepare archive directory
    std::fs::create_dir_all(&config.archive.dir).with_context(|| {
        format!("Failed to create archive directory {:?}", config.archive.dir)
    })?;
    info!("Archives stored in {:?}", config.archive.dir);

    // Build operator
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(config.fetcher.clone()).context("Failed to create HTTP fetcher")?,
    );
    let writer: Arc<dyn ArchiveWriter> = match &config.archive.staging_dir {
        Some(dir) => {
            info!("Staging archive rewrites in {:?}", dir);
            Arc::new(ZipArchiveWriter::with_staging_dir(dir))
        }
        None => Arc::new(ZipArchiveWriter::new()),
    };

    let operator = Arc::new(ArchiveOperator::new(
        config.operator.clone(),
        config.archive.clone(),
        store,
        fetcher,
        writer,
    ));

    if let Some(timeout) = config.operator.stall_timeout() {
        info!("Idle jobs expire after {:?}", timeout);
    }

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&operator)));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let queued appends land before exiting
    info!("Server shutting down...");
    operator.shutdown().await;
    info!("Archive writers stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
