use crate::model::UserId;
use serde::{Deserialize, Serialize};

/// The signed-in operator as persisted by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: String::new(),
            phone: String::new(),
            full_name: full_name.into(),
            role: None,
        }
    }
}

/// Session file contents. `user` is `null` after sign-out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Option<SessionUser>,
    /// Bearer token for row-level security, when the backend issued one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl AuthSession {
    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            access_token: None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }
}
