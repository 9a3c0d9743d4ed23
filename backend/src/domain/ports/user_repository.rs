//! Port for user account persistence.
//!
//! This is the contract the authentication collaborator builds an
//! [`crate::domain::IdentityContext`] from; the core never hashes passwords
//! or manages sessions.

use async_trait::async_trait;

use crate::domain::user::{NewUser, User, UserId};

/// Errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// The username is already taken.
    #[error("username already exists: {username}")]
    DuplicateUsername { username: String },
}

impl UserRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a duplicate-username error.
    pub fn duplicate_username(username: impl Into<String>) -> Self {
        Self::DuplicateUsername {
            username: username.into(),
        }
    }
}

/// Port for user account rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Find a user by unique username.
    async fn find_by_username(&self, username: &str)
    -> Result<Option<User>, UserRepositoryError>;

    /// Persist a new user account.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;
}

/// Fixture implementation for tests that do not exercise user accounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_by_username(
        &self,
        _username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        Err(UserRepositoryError::query(format!(
            "fixture cannot insert user {}",
            user.username
        )))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_lookups_return_nothing() {
        let repo = FixtureUserRepository;
        let by_id = repo
            .find_by_id(UserId::new(1))
            .await
            .expect("fixture lookup succeeds");
        assert!(by_id.is_none());
        let by_name = repo
            .find_by_username("dewi")
            .await
            .expect("fixture lookup succeeds");
        assert!(by_name.is_none());
    }

    #[rstest]
    fn duplicate_username_error_carries_the_name() {
        let err = UserRepositoryError::duplicate_username("dewi");
        assert_eq!(err.to_string(), "username already exists: dewi");
    }
}
