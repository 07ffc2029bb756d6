use common::EntityId;
use serde::{Deserialize, Serialize};

/// Who a permission entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "owner_type", content = "owner_id")]
pub enum PermissionOwner {
    Role(EntityId),
    User(EntityId),
}

fn granted() -> bool {
    true
}

/// A named permission granted to (or, for users, explicitly denied to) a
/// role or user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub owner: PermissionOwner,
    #[serde(default = "granted")]
    pub is_granted: bool,
}

impl Permission {
    pub fn granted(name: impl Into<String>, owner: PermissionOwner) -> Self {
        Self {
            name: name.into(),
            owner,
            is_granted: true,
        }
    }

    pub fn denied(name: impl Into<String>, owner: PermissionOwner) -> Self {
        Self {
            name: name.into(),
            owner,
            is_granted: false,
        }
    }
}
