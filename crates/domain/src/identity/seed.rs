//! Idempotent identity seeding.

use common::{Outcome, PageRequest, SharedClock, UserSession, paging::MAX_PAGE_SIZE};
use store::{Entity, EntityStore, StoreError, UnitOfWork};

use super::{PasswordHasher, PermissionNames, Role, RoleNames, User};
use crate::error::DomainError;

/// Credentials of the administrator account created on first start.
#[derive(Clone)]
pub struct AdminSeed {
    pub user_name: String,
    pub password: String,
    pub display_name: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// What a seeding run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub role_created: bool,
    pub permissions_added: usize,
    pub user_created: bool,
    pub role_assigned: bool,
}

impl SeedReport {
    pub fn changed_anything(&self) -> bool {
        self.role_created || self.permissions_added > 0 || self.user_created || self.role_assigned
    }
}

/// Ensures the Administrators role holds every permission and the
/// configured administrator exists and belongs to it.
///
/// Safe to run on every start: a second run changes nothing. The
/// administrator's direct permission grants are cleared so the role alone
/// decides what the account may do.
#[tracing::instrument(skip(store, clock, hasher), fields(admin = %admin.user_name))]
pub async fn seed_identity<S: EntityStore + Clone>(
    store: S,
    clock: SharedClock,
    admin: &AdminSeed,
    hasher: &dyn PasswordHasher,
) -> Result<SeedReport, DomainError> {
    let mut uow = UnitOfWork::new(store, UserSession::anonymous(), clock);
    let mut report = SeedReport::default();

    let role_key = Role::normalize(RoleNames::ADMINISTRATORS);
    let mut role = match find_first::<_, Role>(&mut uow, |r| r.normalized_name() == role_key).await? {
        Some(role) => {
            tracing::info!("administrators role already exists");
            role
        }
        None => {
            let role = Role::new(
                RoleNames::ADMINISTRATORS,
                Some("Removing this role disrupts system administration.".to_string()),
            );
            uow.set::<Role>().add(&role)?;
            report.role_created = true;
            role
        }
    };

    for name in PermissionNames::NAME_LIST {
        if role.grant(name) {
            report.permissions_added += 1;
        }
    }
    if report.permissions_added > 0 {
        tracing::info!(added = report.permissions_added, "granted new permissions to administrators");
        uow.set::<Role>().update(&role)?;
    }

    let user_key = User::normalize(&admin.user_name);
    let mut user =
        match find_first::<_, User>(&mut uow, |u| u.normalized_user_name() == user_key).await? {
            Some(user) => {
                tracing::info!("admin user already exists");
                user
            }
            None => {
                let user = match User::new(
                    &admin.user_name,
                    &admin.display_name,
                    &admin.password,
                    hasher,
                ) {
                    Outcome::Ok(user) => user,
                    Outcome::Fail(failure) => {
                        return Err(DomainError::InvalidConfiguration(format!(
                            "admin user: {failure}"
                        )));
                    }
                };
                uow.set::<User>().add(&user)?;
                report.user_created = true;
                user
            }
        };

    let had_direct_permissions = !user.permissions().is_empty();
    report.role_assigned = user.assign_role(role.id());
    if !report.role_assigned {
        tracing::info!("admin user is already in the administrators role");
    }
    user.clear_permissions();
    if report.role_assigned || had_direct_permissions {
        uow.set::<User>().update(&user)?;
    }

    uow.save_changes().await?;
    tracing::info!(?report, "identity seeded");
    Ok(report)
}

/// Scans stored entities page by page for the first match.
async fn find_first<S, T>(
    uow: &mut UnitOfWork<S>,
    predicate: impl Fn(&T) -> bool,
) -> Result<Option<T>, StoreError>
where
    S: EntityStore,
    T: Entity,
{
    let mut page = 1;
    loop {
        let result = uow
            .set::<T>()
            .list(PageRequest::new(page, MAX_PAGE_SIZE))
            .await?;
        let exhausted = u64::from(page) >= result.page_count();

        if let Some(found) = result.items.into_iter().find(|item| predicate(item)) {
            return Ok(Some(found));
        }
        if exhausted {
            return Ok(None);
        }
        page += 1;
    }
}

#[cfg(test)]
mod tests {
    use common::system_clock;
    use store::InMemoryEntityStore;

    use super::*;
    use crate::identity::Sha256PasswordHasher;

    fn admin() -> AdminSeed {
        AdminSeed {
            user_name: "admin".to_string(),
            password: "Admin@123".to_string(),
            display_name: "Administrator".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_run_creates_everything() {
        let store = InMemoryEntityStore::new();
        let report = seed_identity(store.clone(), system_clock(), &admin(), &Sha256PasswordHasher)
            .await
            .unwrap();

        assert!(report.role_created);
        assert!(report.user_created);
        assert!(report.role_assigned);
        assert_eq!(report.permissions_added, PermissionNames::NAME_LIST.len());
        assert_eq!(store.count("Role").await.unwrap(), 1);
        assert_eq!(store.count("User").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let store = InMemoryEntityStore::new();
        seed_identity(store.clone(), system_clock(), &admin(), &Sha256PasswordHasher)
            .await
            .unwrap();
        let report = seed_identity(store.clone(), system_clock(), &admin(), &Sha256PasswordHasher)
            .await
            .unwrap();

        assert!(!report.changed_anything());
        assert_eq!(store.count("Role").await.unwrap(), 1);
        assert_eq!(store.count("User").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admin_can_sign_in_with_every_permission() {
        let store = InMemoryEntityStore::new();
        seed_identity(store.clone(), system_clock(), &admin(), &Sha256PasswordHasher)
            .await
            .unwrap();

        let mut uow = UnitOfWork::new(store, UserSession::anonymous(), system_clock());
        let user = find_first::<_, User>(&mut uow, |u| u.user_name() == "admin")
            .await
            .unwrap()
            .unwrap();
        let role = find_first::<_, Role>(&mut uow, |_| true).await.unwrap().unwrap();

        assert!(user.verify_password("Admin@123", &Sha256PasswordHasher));
        assert_eq!(
            user.effective_permissions(std::slice::from_ref(&role)).len(),
            PermissionNames::NAME_LIST.len()
        );
    }

    #[tokio::test]
    async fn test_invalid_admin_is_a_configuration_error() {
        let mut seed = admin();
        seed.password = "x".to_string();
        let err = seed_identity(
            InMemoryEntityStore::new(),
            system_clock(),
            &seed,
            &Sha256PasswordHasher,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfiguration(_)));
    }
}
