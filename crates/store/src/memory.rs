use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{PageRequest, PagedResult};
use tokio::sync::RwLock;

use crate::{
    EntityId, EntityRecord, Result, StoreError,
    store::{Change, EntityStore, validate_changes},
};

type Key = (String, EntityId);

/// In-memory entity store implementation for tests and local runs.
///
/// Provides the same interface and concurrency semantics as the
/// PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEntityStore {
    records: Arc<RwLock<HashMap<Key, EntityRecord>>>,
}

impl InMemoryEntityStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored, across all types.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Removes every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    fn check(records: &HashMap<Key, EntityRecord>, change: &Change) -> Result<()> {
        match change {
            Change::Insert(record) => {
                let key = (record.entity_type.clone(), record.id);
                if records.contains_key(&key) {
                    return Err(StoreError::DuplicateKey {
                        entity_type: record.entity_type.clone(),
                        id: record.id,
                    });
                }
                Ok(())
            }
            Change::Update { record, expected } => {
                Self::check_version(records, &record.entity_type, record.id, *expected)
            }
            Change::Delete {
                entity_type,
                id,
                expected,
            } => Self::check_version(records, entity_type, *id, *expected),
        }
    }

    fn check_version(
        records: &HashMap<Key, EntityRecord>,
        entity_type: &str,
        id: EntityId,
        expected: crate::RowVersion,
    ) -> Result<()> {
        let current = records
            .get(&(entity_type.to_string(), id))
            .ok_or_else(|| StoreError::not_found(entity_type, id))?;

        if current.row_version != expected {
            return Err(StoreError::ConcurrencyConflict {
                entity_type: entity_type.to_string(),
                id,
                expected,
                actual: current.row_version,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get(&self, entity_type: &str, id: EntityId) -> Result<Option<EntityRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(entity_type.to_string(), id)).cloned())
    }

    async fn list(
        &self,
        entity_type: &str,
        page: PageRequest,
    ) -> Result<PagedResult<EntityRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| r.entity_type == entity_type)
            .cloned()
            .collect();

        // Sort by creation time then id
        matching.sort_by(|a, b| {
            a.audit
                .created_at
                .cmp(&b.audit.created_at)
                .then(a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();

        Ok(PagedResult::new(items, total, page))
    }

    async fn count(&self, entity_type: &str) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.entity_type == entity_type)
            .count() as u64)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<Vec<EntityRecord>> {
        validate_changes(&changes)?;

        let mut records = self.records.write().await;

        // Check every precondition before touching anything
        for change in &changes {
            Self::check(&records, change)?;
        }

        let mut written = Vec::with_capacity(changes.len());
        for change in changes {
            match change {
                Change::Insert(mut record) => {
                    record.row_version = crate::RowVersion::first();
                    records.insert((record.entity_type.clone(), record.id), record.clone());
                    written.push(record);
                }
                Change::Update {
                    mut record,
                    expected,
                } => {
                    let key = (record.entity_type.clone(), record.id);
                    if let Some(current) = records.get(&key) {
                        // Creation columns are owned by the stored row
                        record.audit.created_at = current.audit.created_at;
                        record.audit.created_by_user_id = current.audit.created_by_user_id;
                        record.audit.created_by_ip = current.audit.created_by_ip.clone();
                        record.audit.created_by_browser =
                            current.audit.created_by_browser.clone();
                    }
                    record.row_version = expected.next();
                    records.insert(key, record.clone());
                    written.push(record);
                }
                Change::Delete {
                    entity_type, id, ..
                } => {
                    records.remove(&(entity_type, id));
                }
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use common::UserSession;

    use super::*;
    use crate::{AuditInfo, RowVersion};

    fn create_test_record(id: EntityId, name: &str) -> EntityRecord {
        EntityRecord::new(
            "TestEntity",
            id,
            serde_json::json!({ "name": name }),
            AuditInfo::created(&UserSession::anonymous(), Utc::now()),
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryEntityStore::new();
        let id = EntityId::new();

        let written = store
            .commit(vec![Change::Insert(create_test_record(id, "a"))])
            .await
            .unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].row_version, RowVersion::first());

        let record = store.get("TestEntity", id).await.unwrap().unwrap();
        assert_eq!(record.payload["name"], "a");
        assert!(store.get("Other", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryEntityStore::new();
        let id = EntityId::new();
        store
            .commit(vec![Change::Insert(create_test_record(id, "a"))])
            .await
            .unwrap();

        let result = store
            .commit(vec![Change::Insert(create_test_record(id, "b"))])
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn update_increments_row_version() {
        let store = InMemoryEntityStore::new();
        let id = EntityId::new();
        store
            .commit(vec![Change::Insert(create_test_record(id, "a"))])
            .await
            .unwrap();

        let written = store
            .commit(vec![Change::Update {
                record: create_test_record(id, "b"),
                expected: RowVersion::first(),
            }])
            .await
            .unwrap();

        assert_eq!(written[0].row_version, RowVersion::new(2));
        let record = store.get("TestEntity", id).await.unwrap().unwrap();
        assert_eq!(record.payload["name"], "b");
        assert_eq!(record.row_version, RowVersion::new(2));
    }

    #[tokio::test]
    async fn stale_update_is_a_concurrency_conflict() {
        let store = InMemoryEntityStore::new();
        let id = EntityId::new();
        store
            .commit(vec![Change::Insert(create_test_record(id, "a"))])
            .await
            .unwrap();
        store
            .commit(vec![Change::Update {
                record: create_test_record(id, "b"),
                expected: RowVersion::first(),
            }])
            .await
            .unwrap();

        // A second writer still holding version 1
        let result = store
            .commit(vec![Change::Update {
                record: create_test_record(id, "c"),
                expected: RowVersion::first(),
            }])
            .await;

        match result {
            Err(StoreError::ConcurrencyConflict {
                expected, actual, ..
            }) => {
                assert_eq!(expected, RowVersion::first());
                assert_eq!(actual, RowVersion::new(2));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = InMemoryEntityStore::new();
        let result = store
            .commit(vec![Change::Update {
                record: create_test_record(EntityId::new(), "a"),
                expected: RowVersion::first(),
            }])
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn failed_batch_writes_nothing() {
        let store = InMemoryEntityStore::new();
        let existing = EntityId::new();
        store
            .commit(vec![Change::Insert(create_test_record(existing, "a"))])
            .await
            .unwrap();

        let fresh = EntityId::new();
        let result = store
            .commit(vec![
                Change::Insert(create_test_record(fresh, "new")),
                Change::Update {
                    record: create_test_record(existing, "stale"),
                    expected: RowVersion::new(7),
                },
            ])
            .await;

        assert!(result.is_err());
        assert!(store.get("TestEntity", fresh).await.unwrap().is_none());
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn delete_checks_version() {
        let store = InMemoryEntityStore::new();
        let id = EntityId::new();
        store
            .commit(vec![Change::Insert(create_test_record(id, "a"))])
            .await
            .unwrap();

        let stale = store
            .commit(vec![Change::Delete {
                entity_type: "TestEntity".to_string(),
                id,
                expected: RowVersion::new(3),
            }])
            .await;
        assert!(matches!(
            stale,
            Err(StoreError::ConcurrencyConflict { .. })
        ));

        store
            .commit(vec![Change::Delete {
                entity_type: "TestEntity".to_string(),
                id,
                expected: RowVersion::first(),
            }])
            .await
            .unwrap();
        assert!(store.get("TestEntity", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_preserves_creation_audit() {
        let store = InMemoryEntityStore::new();
        let id = EntityId::new();
        let creator = UserSession::for_user(EntityId::new(), "creator");
        let created_at = Utc::now() - Duration::hours(1);
        let original = EntityRecord::new(
            "TestEntity",
            id,
            serde_json::json!({}),
            AuditInfo::created(&creator, created_at),
        );
        store.commit(vec![Change::Insert(original)]).await.unwrap();

        // Writer sends a record whose creation columns are wrong
        let update = create_test_record(id, "b");
        store
            .commit(vec![Change::Update {
                record: update,
                expected: RowVersion::first(),
            }])
            .await
            .unwrap();

        let stored = store.get("TestEntity", id).await.unwrap().unwrap();
        assert_eq!(stored.audit.created_at, created_at);
        assert_eq!(stored.audit.created_by_user_id, creator.user_id);
    }

    #[tokio::test]
    async fn list_pages_in_creation_order() {
        let store = InMemoryEntityStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let mut record = create_test_record(EntityId::new(), &format!("item-{i}"));
            record.audit.created_at = base + Duration::seconds(i);
            store.commit(vec![Change::Insert(record)]).await.unwrap();
        }
        let mut other = create_test_record(EntityId::new(), "other");
        other.entity_type = "Other".to_string();
        store.commit(vec![Change::Insert(other)]).await.unwrap();

        let page = store
            .list("TestEntity", PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.total_count, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].payload["name"], "item-2");
        assert_eq!(page.items[1].payload["name"], "item-3");

        assert_eq!(store.count("TestEntity").await.unwrap(), 5);
        assert_eq!(store.count("Other").await.unwrap(), 1);
    }
}
