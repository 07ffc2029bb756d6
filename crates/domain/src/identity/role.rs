use common::EntityId;
use serde::{Deserialize, Serialize};
use store::Entity;

use super::{Permission, PermissionOwner};

/// A named group of permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    id: EntityId,
    name: String,
    normalized_name: String,
    description: Option<String>,
    permissions: Vec<Permission>,
}

impl Entity for Role {
    const ENTITY_TYPE: &'static str = "Role";

    fn id(&self) -> EntityId {
        self.id
    }
}

impl Role {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let name = name.into();
        Self {
            id: EntityId::new(),
            normalized_name: Self::normalize(&name),
            name,
            description,
            permissions: Vec::new(),
        }
    }

    /// Case-insensitive lookup key for a role name.
    pub fn normalize(name: &str) -> String {
        name.trim().to_uppercase()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.is_granted && p.name == name)
    }

    /// Grants a permission. Returns false if it was already granted.
    pub fn grant(&mut self, name: &str) -> bool {
        if self.has_permission(name) {
            return false;
        }
        self.permissions
            .push(Permission::granted(name, PermissionOwner::Role(self.id)));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_is_idempotent() {
        let mut role = Role::new("Clerks", None);
        assert!(role.grant("Orders_View"));
        assert!(!role.grant("Orders_View"));
        assert_eq!(role.permissions().len(), 1);
        assert_eq!(
            role.permissions()[0].owner,
            PermissionOwner::Role(role.id())
        );
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(Role::new(" Administrators", None).normalized_name(), "ADMINISTRATORS");
    }
}
