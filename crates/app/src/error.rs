//! Host error types.

use cqrs::{DispatchError, RouteError};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Failures that stop the host from starting or serving.
///
/// Per-request failures never surface here; they are answered on the
/// output stream instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Handler registration failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Route registration failed: {0}")]
    Route(#[from] RouteError),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
