//! Request host entry point.

use std::process::ExitCode;

use app::{AppError, Config, Host, LogFormat};
use common::system_clock;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::io::BufReader;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Logs go to stderr; stdout carries responses.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Installs the Prometheus recorder, serving it over HTTP when
/// `METRICS_ADDR` is set.
fn install_metrics(config: &Config) -> Result<PrometheusHandle, AppError> {
    let builder = PrometheusBuilder::new();
    let Some(addr) = config.metrics_addr else {
        return builder
            .install_recorder()
            .map_err(|err| AppError::Metrics(err.to_string()));
    };

    let (recorder, exporter) = builder
        .with_http_listener(addr)
        .build()
        .map_err(|err| AppError::Metrics(err.to_string()))?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|err| AppError::Metrics(err.to_string()))?;

    tokio::spawn(async move {
        if let Err(err) = exporter.await {
            tracing::error!(error = ?err, "metrics exporter stopped");
        }
    });
    tracing::info!(%addr, "serving Prometheus metrics");
    Ok(handle)
}

async fn run(config: Config) -> Result<(), AppError> {
    let metrics = install_metrics(&config)?;
    tracing::info!(?config, "starting request host");

    let router = app::bootstrap(&config, system_clock()).await?;
    let host = Host::new(router).with_metrics(metrics);

    let stdin = BufReader::new(tokio::io::stdin());
    let stats = host
        .serve(stdin, tokio::io::stdout(), shutdown_signal())
        .await?;

    tracing::info!(
        received = stats.received,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "request host shut down gracefully"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "request host failed");
            ExitCode::FAILURE
        }
    }
}
