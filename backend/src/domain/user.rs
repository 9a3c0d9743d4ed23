//! User records backing authentication.
//!
//! User lifecycle (registration, password hashing, session issuance) is
//! owned by the authentication collaborator; the core only stores the record
//! it derives an [`crate::domain::IdentityContext`] from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::category::CategoryId;
use crate::domain::identity::Role;

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored user account.
///
/// `category_id = None` grants unrestricted reads; the role still gates
/// writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub category_id: Option<CategoryId>,
}

/// Insert payload for a new or updated user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub category_id: Option<CategoryId>,
}
