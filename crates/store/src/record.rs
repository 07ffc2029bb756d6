use chrono::{DateTime, Utc};
use common::UserSession;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::EntityId;

/// Row version of a stored entity, used for optimistic concurrency control.
///
/// A freshly inserted row is at version 1 and every update increments it.
/// Version 0 means "never stored".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RowVersion(i64);

impl RowVersion {
    /// Creates a row version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The version of an entity that has not been stored yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// The version assigned on insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RowVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RowVersion {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<RowVersion> for i64 {
    fn from(version: RowVersion) -> Self {
        version.0
    }
}

/// Who created and last modified a row, from where, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Option<EntityId>,
    pub created_by_ip: Option<String>,
    pub created_by_browser: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by_user_id: Option<EntityId>,
    pub modified_by_ip: Option<String>,
    pub modified_by_browser: Option<String>,
}

impl AuditInfo {
    /// Audit columns for a row inserted by `session` at `at`.
    pub fn created(session: &UserSession, at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            created_by_user_id: session.user_id,
            created_by_ip: session.ip.clone(),
            created_by_browser: session.browser_name.clone(),
            modified_at: None,
            modified_by_user_id: None,
            modified_by_ip: None,
            modified_by_browser: None,
        }
    }

    /// Returns a copy stamped as modified by `session` at `at`.
    ///
    /// The creation columns are left unchanged.
    pub fn modified(&self, session: &UserSession, at: DateTime<Utc>) -> Self {
        Self {
            modified_at: Some(at),
            modified_by_user_id: session.user_id,
            modified_by_ip: session.ip.clone(),
            modified_by_browser: session.browser_name.clone(),
            ..self.clone()
        }
    }
}

/// A persisted entity: its JSON payload plus bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// The kind of entity (e.g., "Order", "Product").
    pub entity_type: String,

    pub id: EntityId,

    /// Concurrency token; see [`RowVersion`].
    pub row_version: RowVersion,

    /// The serialized entity.
    pub payload: serde_json::Value,

    pub audit: AuditInfo,
}

impl EntityRecord {
    /// Creates a record at [`RowVersion::first`].
    pub fn new(
        entity_type: impl Into<String>,
        id: EntityId,
        payload: serde_json::Value,
        audit: AuditInfo,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            row_version: RowVersion::first(),
            payload,
            audit,
        }
    }

    /// Deserializes the payload into an entity.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
