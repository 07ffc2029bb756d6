use std::collections::BTreeSet;

use common::{EntityId, Outcome};
use serde::{Deserialize, Serialize};
use store::Entity;
use uuid::Uuid;

use super::{PasswordHasher, Permission, PermissionOwner, Role};

/// Shortest password accepted.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// An account that can sign in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: EntityId,
    user_name: String,
    normalized_user_name: String,
    display_name: String,
    password_hash: String,
    security_stamp: String,
    is_active: bool,
    roles: Vec<EntityId>,
    permissions: Vec<Permission>,
}

impl Entity for User {
    const ENTITY_TYPE: &'static str = "User";

    fn id(&self) -> EntityId {
        self.id
    }
}

fn new_security_stamp() -> String {
    Uuid::new_v4().simple().to_string()
}

impl User {
    /// Creates an active user with a hashed password.
    pub fn new(
        user_name: impl Into<String>,
        display_name: impl Into<String>,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> Outcome<User> {
        let user_name = user_name.into().trim().to_string();
        let display_name = display_name.into().trim().to_string();

        let mut errors = Vec::new();
        if user_name.is_empty() {
            errors.push("User name is required.".to_string());
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters."
            ));
        }
        if !errors.is_empty() {
            return Outcome::fail_many(errors);
        }

        let security_stamp = new_security_stamp();
        Outcome::ok_with(Self {
            id: EntityId::new(),
            normalized_user_name: Self::normalize(&user_name),
            display_name: if display_name.is_empty() {
                user_name.clone()
            } else {
                display_name
            },
            user_name,
            password_hash: hasher.hash_password(password, &security_stamp),
            security_stamp,
            is_active: true,
            roles: Vec::new(),
            permissions: Vec::new(),
        })
    }

    /// Case-insensitive lookup key for a user name.
    pub fn normalize(user_name: &str) -> String {
        user_name.trim().to_uppercase()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn normalized_user_name(&self) -> &str {
        &self.normalized_user_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn security_stamp(&self) -> &str {
        &self.security_stamp
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn roles(&self) -> &[EntityId] {
        &self.roles
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn verify_password(&self, password: &str, hasher: &dyn PasswordHasher) -> bool {
        hasher.verify_password(&self.password_hash, password, &self.security_stamp)
    }

    /// Replaces the password and rotates the security stamp.
    pub fn change_password(&mut self, password: &str, hasher: &dyn PasswordHasher) -> Outcome {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Outcome::fail(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters."
            ));
        }
        self.security_stamp = new_security_stamp();
        self.password_hash = hasher.hash_password(password, &self.security_stamp);
        Outcome::ok()
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn is_in_role(&self, role_id: EntityId) -> bool {
        self.roles.contains(&role_id)
    }

    /// Adds the user to a role. Returns false if already a member.
    pub fn assign_role(&mut self, role_id: EntityId) -> bool {
        if self.is_in_role(role_id) {
            return false;
        }
        self.roles.push(role_id);
        true
    }

    /// Grants a permission directly to the user.
    pub fn grant_permission(&mut self, name: &str) {
        self.set_permission(Permission::granted(name, PermissionOwner::User(self.id)));
    }

    /// Denies a permission even if one of the user's roles grants it.
    pub fn deny_permission(&mut self, name: &str) {
        self.set_permission(Permission::denied(name, PermissionOwner::User(self.id)));
    }

    /// Drops every direct grant and denial.
    pub fn clear_permissions(&mut self) {
        self.permissions.clear();
    }

    fn set_permission(&mut self, permission: Permission) {
        self.permissions.retain(|p| p.name != permission.name);
        self.permissions.push(permission);
    }

    /// Permission names the user holds: grants from the user's roles plus
    /// direct grants, minus direct denials. Roles the user is not a member
    /// of are ignored; an inactive user holds nothing.
    pub fn effective_permissions(&self, roles: &[Role]) -> BTreeSet<String> {
        if !self.is_active {
            return BTreeSet::new();
        }

        let mut names: BTreeSet<String> = roles
            .iter()
            .filter(|role| self.is_in_role(role.id()))
            .flat_map(|role| role.permissions())
            .filter(|p| p.is_granted)
            .map(|p| p.name.clone())
            .collect();

        for permission in &self.permissions {
            if permission.is_granted {
                names.insert(permission.name.clone());
            } else {
                names.remove(&permission.name);
            }
        }
        names
    }

    pub fn has_permission(&self, name: &str, roles: &[Role]) -> bool {
        self.effective_permissions(roles).contains(name)
    }
}
