//! Caller identity passed explicitly into every domain operation.
//!
//! The authentication collaborator resolves the session and builds an
//! [`IdentityContext`] per call. The core only reads it; identity is never
//! held as ambient state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::category::CategoryId;
use crate::domain::user::{User, UserId};

/// Role attached to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted access, including deletes and category management.
    Admin,
    /// Item writes within the identity's own category.
    Staff,
    /// Quantity-change operations only; no item field writes.
    Operator,
}

impl Role {
    /// Stable string form stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing an unrecognised role string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {value}")]
pub struct UnknownRole {
    /// The rejected input.
    pub value: String,
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "operator" => Ok(Self::Operator),
            other => Err(UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// The caller's resolved identity: who they are, what role they hold, and
/// which category (if any) scopes their visibility and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    /// Authenticated user id.
    pub user_id: UserId,
    /// Username recorded as the actor on audit rows.
    pub username: String,
    /// Role gating writes.
    pub role: Role,
    /// Category scope; `None` means unrestricted reads.
    pub category_id: Option<CategoryId>,
}

impl IdentityContext {
    /// Build an identity context from its parts.
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        role: Role,
        category_id: Option<CategoryId>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
            category_id,
        }
    }

    /// Whether the identity holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for IdentityContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            category_id: user.category_id,
        }
    }
}
