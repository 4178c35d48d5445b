use anyhow::{Context, Result};
use clap::Parser;
use sensor_service::config::{Config, StoreBackend};
use sensor_service::grpc::start_grpc_server;
use sensor_service::health::{start_api_server, HealthState};
use sensor_service::logger::{init_tracing, TracingLog};
use sensor_service::service::SensorService;
use sensor_service::store::{InMemorySensorStore, PgSensorStore, SensorStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sensor-service")]
#[command(about = "gRPC service for creating, querying and updating sensors")]
struct Cli {
    /// Output debug log messages
    #[arg(long, env = "SENSORS_VERBOSE")]
    verbose: bool,

    /// Configuration file (defaults to config/sensors.* if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service, cli.verbose)?;

    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.store.backend,
        "Starting sensor service"
    );

    config.validate()?;

    if config.service.metrics_enabled {
        init_metrics(config.service.metrics_port)?;
    }

    let store = build_store(&config).await?;
    let logger = Arc::new(TracingLog::new(cli.verbose));
    let service = Arc::new(SensorService::new(store.clone(), logger));

    let health_state = Arc::new(HealthState {
        service_name: config.service.name.clone(),
        store,
    });
    let api_config = config.api.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_api_server(health_state, &api_config).await {
            error!(error = %e, "Health API server error");
        }
    });

    info!("Sensor service started successfully");

    let result = start_grpc_server(service, &config.grpc, shutdown_signal()).await;

    info!("Shutting down sensor service");
    api_handle.abort();

    result?;
    info!("Sensor service stopped");

    Ok(())
}

/// Build the configured storage backend
async fn build_store(config: &Config) -> Result<Arc<dyn SensorStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory sensor store");
            Ok(Arc::new(InMemorySensorStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgSensorStore::connect(&config.database)
                .await
                .context("Failed to initialize sensor store")?;

            if config.database.run_migrations {
                store
                    .run_migrations()
                    .await
                    .context("Failed to run database migrations")?;
            }

            Ok(Arc::new(store))
        }
    }
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
