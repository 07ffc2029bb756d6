use async_trait::async_trait;
use common::{Outcome, UserSession};

use crate::request::{Command, Query};

/// Error type handlers use for fatal failures (store errors, programming
/// errors). Expected business failures are `Outcome::Fail` instead.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Handles one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, session: &UserSession, command: C) -> Result<Outcome, BoxError>;
}

/// Handles one query type. Query handlers must not change persisted state.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn handle(
        &self,
        session: &UserSession,
        query: Q,
    ) -> Result<Outcome<Q::Output>, BoxError>;
}
