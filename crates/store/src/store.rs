use std::collections::HashSet;

use async_trait::async_trait;
use common::{PageRequest, PagedResult};

use crate::{EntityId, EntityRecord, Result, RowVersion, StoreError};

/// One write in a committed batch.
#[derive(Debug, Clone)]
pub enum Change {
    /// Insert a new row. The stored row version is always
    /// [`RowVersion::first`].
    Insert(EntityRecord),

    /// Replace the payload of an existing row if it is still at `expected`.
    /// Only the modification audit columns are written.
    Update {
        record: EntityRecord,
        expected: RowVersion,
    },

    /// Delete an existing row if it is still at `expected`.
    Delete {
        entity_type: String,
        id: EntityId,
        expected: RowVersion,
    },
}

impl Change {
    /// Returns the `(entity_type, id)` key this change targets.
    pub fn key(&self) -> (&str, EntityId) {
        match self {
            Change::Insert(record) | Change::Update { record, .. } => {
                (record.entity_type.as_str(), record.id)
            }
            Change::Delete {
                entity_type, id, ..
            } => (entity_type.as_str(), *id),
        }
    }
}

/// Core trait for entity store implementations.
///
/// A store persists entity records keyed by `(entity_type, id)` and enforces
/// row-version optimistic concurrency. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Loads one record.
    async fn get(&self, entity_type: &str, id: EntityId) -> Result<Option<EntityRecord>>;

    /// Lists records of one type, oldest first (creation time, then id).
    async fn list(
        &self,
        entity_type: &str,
        page: PageRequest,
    ) -> Result<PagedResult<EntityRecord>>;

    /// Counts records of one type.
    async fn count(&self, entity_type: &str) -> Result<u64>;

    /// Applies a batch of changes atomically: either every change is
    /// written or none is.
    ///
    /// Fails with `ConcurrencyConflict` when an update or delete finds a
    /// different row version than expected, `NotFound` when its row is gone,
    /// and `DuplicateKey` when an insert collides.
    ///
    /// Returns the stored records for inserts and updates, in batch order.
    async fn commit(&self, changes: Vec<Change>) -> Result<Vec<EntityRecord>>;
}

/// Extension trait providing convenience methods for entity stores.
#[async_trait]
pub trait EntityStoreExt: EntityStore {
    /// Checks whether a record exists.
    async fn exists(&self, entity_type: &str, id: EntityId) -> Result<bool> {
        Ok(self.get(entity_type, id).await?.is_some())
    }

    /// Loads one record, failing with `NotFound` if it is absent.
    async fn get_required(&self, entity_type: &str, id: EntityId) -> Result<EntityRecord> {
        self.get(entity_type, id)
            .await?
            .ok_or_else(|| StoreError::not_found(entity_type, id))
    }
}

// Blanket implementation for all EntityStore implementations
impl<T: EntityStore + ?Sized> EntityStoreExt for T {}

/// Validates a batch before it is applied.
///
/// A batch may touch each key at most once.
pub fn validate_changes(changes: &[Change]) -> Result<()> {
    let mut seen = HashSet::with_capacity(changes.len());
    for change in changes {
        let (entity_type, id) = change.key();
        if !seen.insert((entity_type, id)) {
            return Err(StoreError::InvalidBatch(format!(
                "{entity_type} {id} appears more than once in the batch"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::UserSession;

    use super::*;
    use crate::AuditInfo;

    fn record(id: EntityId) -> EntityRecord {
        EntityRecord::new(
            "Thing",
            id,
            serde_json::json!({}),
            AuditInfo::created(&UserSession::anonymous(), Utc::now()),
        )
    }

    #[test]
    fn empty_batch_is_valid() {
        assert!(validate_changes(&[]).is_ok());
    }

    #[test]
    fn same_key_twice_is_rejected() {
        let id = EntityId::new();
        let changes = vec![
            Change::Insert(record(id)),
            Change::Delete {
                entity_type: "Thing".to_string(),
                id,
                expected: RowVersion::first(),
            },
        ];
        assert!(matches!(
            validate_changes(&changes),
            Err(StoreError::InvalidBatch(_))
        ));
    }

    #[test]
    fn same_id_different_types_is_allowed() {
        let id = EntityId::new();
        let mut other = record(id);
        other.entity_type = "Other".to_string();
        let changes = vec![Change::Insert(record(id)), Change::Insert(other)];
        assert!(validate_changes(&changes).is_ok());
    }
}
