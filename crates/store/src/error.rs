use thiserror::Error;

use crate::{EntityId, RowVersion};

/// Errors that can occur when interacting with the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row version on record did not match the one the writer loaded.
    #[error(
        "Concurrency conflict for {entity_type} {id}: expected row version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        entity_type: String,
        id: EntityId,
        expected: RowVersion,
        actual: RowVersion,
    },

    /// An insert targeted a key that already exists.
    #[error("Duplicate key: {entity_type} {id} already exists")]
    DuplicateKey { entity_type: String, id: EntityId },

    /// The entity does not exist.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: EntityId },

    /// An update or removal was staged for an entity this unit of work
    /// never loaded.
    #[error("Entity is not tracked by this unit of work: {entity_type} {id}")]
    NotTracked { entity_type: String, id: EntityId },

    /// A batch of changes was rejected before reaching storage.
    #[error("Invalid change batch: {0}")]
    InvalidBatch(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity_type: impl Into<String>, id: EntityId) -> Self {
        StoreError::NotFound {
            entity_type: entity_type.into(),
            id,
        }
    }

    /// Returns true for a lost optimistic concurrency race.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
