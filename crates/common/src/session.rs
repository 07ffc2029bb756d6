//! Who is making the current request.

use serde::{Deserialize, Serialize};

use crate::EntityId;

/// The caller of a request, used for audit stamping and logging.
///
/// Every field is optional; system tasks such as seeding run as
/// [`UserSession::anonymous`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub browser_name: Option<String>,
}

impl UserSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: EntityId, user_name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            user_name: Some(user_name.into()),
            ..Self::default()
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_browser(mut self, browser_name: impl Into<String>) -> Self {
        self.browser_name = Some(browser_name.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
