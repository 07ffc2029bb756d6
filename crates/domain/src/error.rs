//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Fatal errors raised by domain handlers.
///
/// Business-rule violations are not errors; they are returned as
/// `Outcome::Fail`.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required argument was not supplied.
    #[error("Value cannot be null. (Parameter '{name}')")]
    ArgumentNull { name: &'static str },

    /// Startup data (such as the administrator seed) is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An error occurred in the entity store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn argument_null(name: &'static str) -> Self {
        DomainError::ArgumentNull { name }
    }

    /// Returns true if a save lost a row-version race.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DomainError::Store(e) if e.is_concurrency_conflict())
    }
}
