//! PostgreSQL-backed `UserRepository` implementation using Diesel.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::category::CategoryId;
use crate::domain::identity::Role;
use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::user::{NewUser, User, UserId};

use super::diesel_helpers::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn map_db(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn user_from_row(row: UserRow) -> Result<User, UserRepositoryError> {
    let role = Role::from_str(&row.role)
        .map_err(|err| UserRepositoryError::query(format!("stored user {} is invalid: {err}", row.id)))?;
    Ok(User {
        id: UserId::new(row.id),
        username: row.username,
        password_hash: row.password_hash,
        role,
        category_id: row.category_id.map(CategoryId::new),
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = users::table
            .find(user_id.as_i64())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_db)?;
        row.map(user_from_row).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_db)?;
        row.map(user_from_row).transpose()
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: UserRow = diesel::insert_into(users::table)
            .values(NewUserRow {
                username: &user.username,
                password_hash: &user.password_hash,
                role: user.role.as_str(),
                category_id: user.category_id.map(CategoryId::as_i64),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    UserRepositoryError::duplicate_username(&user.username)
                } else {
                    map_db(error)
                }
            })?;
        user_from_row(row)
    }
}
