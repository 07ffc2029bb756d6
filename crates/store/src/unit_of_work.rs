//! Unit of work: tracks loaded entities and stages changes until
//! [`UnitOfWork::save_changes`] commits them in one batch.

use std::collections::HashMap;
use std::marker::PhantomData;

use common::{PageRequest, PagedResult, SharedClock, UserSession};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    AuditInfo, EntityId, EntityRecord, Result, RowVersion, StoreError,
    store::{Change, EntityStore},
};

/// A persistable entity.
///
/// Entities are stored as JSON under `(ENTITY_TYPE, id)`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Storage name of the entity kind (e.g., "Order").
    const ENTITY_TYPE: &'static str;

    fn id(&self) -> EntityId;
}

type Key = (&'static str, EntityId);

/// What the unit of work knows about a row it loaded or saved.
#[derive(Debug, Clone)]
struct Tracked {
    row_version: RowVersion,
    audit: AuditInfo,
}

#[derive(Debug, Clone)]
enum Pending {
    Add(serde_json::Value),
    Update(serde_json::Value),
    Remove,
}

/// Tracks entities for one request and writes their changes atomically.
///
/// Units of work are cheap and short-lived: create one per dispatched
/// request, stage changes through [`UnitOfWork::set`], then call
/// [`UnitOfWork::save_changes`].
pub struct UnitOfWork<S: EntityStore> {
    store: S,
    session: UserSession,
    clock: SharedClock,
    tracked: HashMap<Key, Tracked>,
    pending: Vec<(Key, Pending)>,
}

impl<S: EntityStore> UnitOfWork<S> {
    /// Creates a unit of work acting on behalf of `session`.
    pub fn new(store: S, session: UserSession, clock: SharedClock) -> Self {
        Self {
            store,
            session,
            clock,
            tracked: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Returns the session used for audit stamping.
    pub fn session(&self) -> &UserSession {
        &self.session
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns typed access to one kind of entity.
    pub fn set<T: Entity>(&mut self) -> EntitySet<'_, S, T> {
        EntitySet {
            uow: self,
            _phantom: PhantomData,
        }
    }

    /// Returns true if changes are staged and not yet saved.
    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns the row version this unit of work last saw for an entity.
    pub fn row_version<T: Entity>(&self, id: EntityId) -> Option<RowVersion> {
        self.tracked
            .get(&(T::ENTITY_TYPE, id))
            .map(|tracked| tracked.row_version)
    }

    /// Drops every staged change.
    pub fn discard_changes(&mut self) {
        self.pending.clear();
    }

    /// Commits all staged changes in one atomic batch.
    ///
    /// Inserts are stamped with creation audit columns and updates/removals
    /// carry the row version seen at load time. Returns the number of
    /// changes written. On failure the staged changes are kept so the caller
    /// can inspect or discard them.
    #[tracing::instrument(skip(self), fields(pending = self.pending.len()))]
    pub async fn save_changes(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let now = self.clock.now();
        let mut changes = Vec::with_capacity(self.pending.len());

        for ((entity_type, id), pending) in &self.pending {
            let change = match pending {
                Pending::Add(payload) => Change::Insert(EntityRecord::new(
                    *entity_type,
                    *id,
                    payload.clone(),
                    AuditInfo::created(&self.session, now),
                )),
                Pending::Update(payload) => {
                    let tracked = self.tracked_for(*entity_type, *id)?;
                    let mut record = EntityRecord::new(
                        *entity_type,
                        *id,
                        payload.clone(),
                        tracked.audit.modified(&self.session, now),
                    );
                    record.row_version = tracked.row_version;
                    Change::Update {
                        record,
                        expected: tracked.row_version,
                    }
                }
                Pending::Remove => {
                    let tracked = self.tracked_for(*entity_type, *id)?;
                    Change::Delete {
                        entity_type: entity_type.to_string(),
                        id: *id,
                        expected: tracked.row_version,
                    }
                }
            };
            changes.push(change);
        }

        let count = changes.len();
        let written = match self.store.commit(changes).await {
            Ok(written) => written,
            Err(e) => {
                if e.is_concurrency_conflict() {
                    metrics::counter!("store_concurrency_conflicts_total").increment(1);
                    tracing::warn!(error = %e, "save rejected by row version check");
                }
                return Err(e);
            }
        };

        // Written records come back in batch order, one per add/update
        let mut written = written.into_iter();
        for (key, pending) in std::mem::take(&mut self.pending) {
            match pending {
                Pending::Remove => {
                    self.tracked.remove(&key);
                }
                Pending::Add(_) | Pending::Update(_) => {
                    if let Some(record) = written.next() {
                        self.track(key, &record);
                    }
                }
            }
        }

        metrics::counter!("store_commits_total").increment(1);
        tracing::debug!(changes = count, "changes saved");
        Ok(count)
    }

    fn tracked_for(&self, entity_type: &'static str, id: EntityId) -> Result<&Tracked> {
        self.tracked
            .get(&(entity_type, id))
            .ok_or_else(|| StoreError::NotTracked {
                entity_type: entity_type.to_string(),
                id,
            })
    }

    fn track(&mut self, key: Key, record: &EntityRecord) {
        self.tracked.insert(
            key,
            Tracked {
                row_version: record.row_version,
                audit: record.audit.clone(),
            },
        );
    }

    fn pending_for(&self, key: &Key) -> Option<&Pending> {
        self.pending
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, pending)| pending)
    }

    /// Stages a change, folding it into an earlier one for the same key.
    fn stage(&mut self, key: Key, next: Pending) -> Result<()> {
        let Some(index) = self.pending.iter().position(|(k, _)| *k == key) else {
            self.pending.push((key, next));
            return Ok(());
        };

        let folded = match (&self.pending[index].1, next) {
            (Pending::Add(_), Pending::Add(_)) => {
                return Err(StoreError::DuplicateKey {
                    entity_type: key.0.to_string(),
                    id: key.1,
                });
            }
            (Pending::Add(_), Pending::Update(payload)) => Some(Pending::Add(payload)),
            // Added and removed before saving: nothing to write
            (Pending::Add(_), Pending::Remove) => None,
            (Pending::Update(_), Pending::Update(payload)) => Some(Pending::Update(payload)),
            (Pending::Update(_), Pending::Remove) => Some(Pending::Remove),
            (Pending::Update(_), Pending::Add(_)) => {
                return Err(StoreError::DuplicateKey {
                    entity_type: key.0.to_string(),
                    id: key.1,
                });
            }
            (Pending::Remove, _) => {
                return Err(StoreError::InvalidBatch(format!(
                    "{} {} is already staged for removal",
                    key.0, key.1
                )));
            }
        };

        match folded {
            Some(pending) => self.pending[index].1 = pending,
            None => {
                self.pending.remove(index);
            }
        }
        Ok(())
    }
}

/// Typed view over one kind of entity inside a [`UnitOfWork`].
pub struct EntitySet<'a, S: EntityStore, T: Entity> {
    uow: &'a mut UnitOfWork<S>,
    _phantom: PhantomData<T>,
}

impl<S: EntityStore, T: Entity> EntitySet<'_, S, T> {
    /// Finds an entity by id.
    ///
    /// Staged changes are visible: an entity added in this unit of work is
    /// returned before it is saved, and one staged for removal is not.
    pub async fn find(&mut self, id: EntityId) -> Result<Option<T>> {
        let key = (T::ENTITY_TYPE, id);
        match self.uow.pending_for(&key) {
            Some(Pending::Add(payload)) | Some(Pending::Update(payload)) => {
                return Ok(Some(serde_json::from_value(payload.clone())?));
            }
            Some(Pending::Remove) => return Ok(None),
            None => {}
        }

        let Some(record) = self.uow.store.get(T::ENTITY_TYPE, id).await? else {
            return Ok(None);
        };
        let entity = record.decode()?;
        self.uow.track(key, &record);
        Ok(Some(entity))
    }

    /// Finds an entity by id, failing with `NotFound` if it is absent.
    pub async fn get(&mut self, id: EntityId) -> Result<T> {
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::not_found(T::ENTITY_TYPE, id))
    }

    /// Lists stored entities one page at a time. Unsaved changes are not
    /// reflected.
    pub async fn list(&mut self, page: PageRequest) -> Result<PagedResult<T>> {
        let records = self.uow.store.list(T::ENTITY_TYPE, page).await?;

        let mut items = Vec::with_capacity(records.items.len());
        for record in &records.items {
            items.push(record.decode()?);
            self.uow.track((T::ENTITY_TYPE, record.id), record);
        }

        Ok(PagedResult {
            items,
            total_count: records.total_count,
            page: records.page,
            page_size: records.page_size,
        })
    }

    /// Counts stored entities of this kind.
    pub async fn count(&self) -> Result<u64> {
        self.uow.store.count(T::ENTITY_TYPE).await
    }

    /// Stages a new entity for insertion.
    pub fn add(&mut self, entity: &T) -> Result<()> {
        let payload = serde_json::to_value(entity)?;
        self.uow.stage((T::ENTITY_TYPE, entity.id()), Pending::Add(payload))
    }

    /// Stages an update of an entity previously loaded or saved through this
    /// unit of work.
    pub fn update(&mut self, entity: &T) -> Result<()> {
        let key = (T::ENTITY_TYPE, entity.id());
        let staged_add = matches!(self.uow.pending_for(&key), Some(Pending::Add(_)));
        if !staged_add && !self.uow.tracked.contains_key(&key) {
            return Err(StoreError::NotTracked {
                entity_type: T::ENTITY_TYPE.to_string(),
                id: entity.id(),
            });
        }

        let payload = serde_json::to_value(entity)?;
        self.uow.stage(key, Pending::Update(payload))
    }

    /// Stages removal of an entity previously loaded or added through this
    /// unit of work.
    pub fn remove(&mut self, id: EntityId) -> Result<()> {
        let key = (T::ENTITY_TYPE, id);
        let staged_add = matches!(self.uow.pending_for(&key), Some(Pending::Add(_)));
        if !staged_add && !self.uow.tracked.contains_key(&key) {
            return Err(StoreError::NotTracked {
                entity_type: T::ENTITY_TYPE.to_string(),
                id,
            });
        }

        self.uow.stage(key, Pending::Remove)
    }
}
