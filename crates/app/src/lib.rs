//! Request host for the order, catalog and identity domain.
//!
//! Reads JSON request envelopes line by line, routes them through the
//! domain dispatcher and writes one JSON response per line. Logging goes to
//! stderr through `tracing`; metrics are recorded with `metrics` and
//! exported in Prometheus format.

pub mod config;
pub mod error;
pub mod host;

use common::SharedClock;
use cqrs::JsonRouter;
use domain::identity::{Sha256PasswordHasher, seed_identity};
use domain::{build_dispatcher, build_router};
use sqlx::postgres::PgPoolOptions;
use store::{EntityStore, InMemoryEntityStore, PostgresEntityStore};

pub use config::{Config, LogFormat};
pub use error::AppError;
pub use host::{HEALTH_REQUEST, Host, METRICS_REQUEST, ServeStats};

/// Opens the configured store, seeds the administrator and builds the
/// request router.
pub async fn bootstrap(config: &Config, clock: SharedClock) -> Result<JsonRouter, AppError> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;
            let store = PostgresEntityStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("connected to PostgreSQL, migrations applied");
            assemble(store, config, clock).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, entities are kept in memory");
            assemble(InMemoryEntityStore::new(), config, clock).await
        }
    }
}

async fn assemble<S>(store: S, config: &Config, clock: SharedClock) -> Result<JsonRouter, AppError>
where
    S: EntityStore + Clone + 'static,
{
    let report = seed_identity(
        store.clone(),
        clock.clone(),
        &config.admin,
        &Sha256PasswordHasher,
    )
    .await?;
    if !report.changed_anything() {
        tracing::debug!("identity already up to date");
    }

    let dispatcher = build_dispatcher(store, clock)?;
    tracing::info!(handlers = dispatcher.handler_count(), "dispatcher ready");
    Ok(build_router(dispatcher)?)
}
