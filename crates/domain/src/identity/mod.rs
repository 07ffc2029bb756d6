//! Users, roles and permissions.

mod handlers;
mod names;
mod password;
mod permission;
mod role;
mod seed;
mod user;

pub use handlers::{GetUserPermissions, IdentityHandlers, UserPermissions};
pub use names::{PermissionNames, RoleNames};
pub use password::{PasswordHasher, Sha256PasswordHasher};
pub use permission::{Permission, PermissionOwner};
pub use role::Role;
pub use seed::{AdminSeed, SeedReport, seed_identity};
pub use user::User;
