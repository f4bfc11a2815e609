// Account domain types
//
// An account is the identity that owns events and authenticates against the
// token endpoint. The password hash never leaves the storage/service layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountRole {
    Admin,
    User,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "ADMIN",
            AccountRole::User => "USER",
        }
    }

    /// Parse a stored role name. Unknown names are ignored by callers.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Some(AccountRole::Admin),
            "USER" => Some(AccountRole::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered account (public view, no credentials)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<AccountRole>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn has_role(&self, role: AccountRole) -> bool {
        self.roles.contains(&role)
    }
}
