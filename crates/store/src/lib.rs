//! Audited entity persistence.
//!
//! Entities are stored as JSON records keyed by `(entity_type, id)` and
//! carry a [`RowVersion`] concurrency token plus [`AuditInfo`] columns.
//! Application code works through a [`UnitOfWork`], which tracks what it
//! loaded and commits staged changes atomically through an [`EntityStore`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;
pub mod unit_of_work;

pub use common::EntityId;
pub use error::{Result, StoreError};
pub use memory::InMemoryEntityStore;
pub use postgres::PostgresEntityStore;
pub use record::{AuditInfo, EntityRecord, RowVersion};
pub use store::{Change, EntityStore, EntityStoreExt, validate_changes};
pub use unit_of_work::{Entity, EntitySet, UnitOfWork};
