use async_trait::async_trait;
use common::{EntityId, Outcome, SharedClock, UserSession};
use cqrs::{BoxError, Query, QueryHandler};
use serde::{Deserialize, Serialize};
use store::{EntityStore, UnitOfWork};

use super::{Role, User};
use crate::error::DomainError;

/// Resolves the permissions a user effectively holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetUserPermissions {
    pub user_id: EntityId,
}

impl GetUserPermissions {
    pub fn new(user_id: EntityId) -> Self {
        Self { user_id }
    }
}

impl Query for GetUserPermissions {
    const NAME: &'static str = "GetUserPermissions";
    type Output = UserPermissions;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPermissions {
    pub user_id: EntityId,
    pub user_name: String,
    pub is_active: bool,
    /// Sorted permission names.
    pub permissions: Vec<String>,
}

/// Handles identity requests.
#[derive(Clone)]
pub struct IdentityHandlers<S> {
    store: S,
    clock: SharedClock,
}

impl<S: EntityStore + Clone + 'static> IdentityHandlers<S> {
    pub fn new(store: S, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    #[tracing::instrument(skip(self, session))]
    async fn user_permissions(
        &self,
        session: &UserSession,
        query: GetUserPermissions,
    ) -> Result<Outcome<UserPermissions>, DomainError> {
        let mut uow = UnitOfWork::new(self.store.clone(), session.clone(), self.clock.clone());
        let Some(user) = uow.set::<User>().find(query.user_id).await? else {
            return Ok(Outcome::fail("User not found."));
        };

        let mut roles = Vec::with_capacity(user.roles().len());
        for role_id in user.roles() {
            // A deleted role simply grants nothing
            if let Some(role) = uow.set::<Role>().find(*role_id).await? {
                roles.push(role);
            }
        }

        Ok(Outcome::ok_with(UserPermissions {
            user_id: query.user_id,
            user_name: user.user_name().to_string(),
            is_active: user.is_active(),
            permissions: user.effective_permissions(&roles).into_iter().collect(),
        }))
    }
}

#[async_trait]
impl<S: EntityStore + Clone + 'static> QueryHandler<GetUserPermissions> for IdentityHandlers<S> {
    async fn handle(
        &self,
        session: &UserSession,
        query: GetUserPermissions,
    ) -> Result<Outcome<UserPermissions>, BoxError> {
        Ok(self.user_permissions(session, query).await?)
    }
}
