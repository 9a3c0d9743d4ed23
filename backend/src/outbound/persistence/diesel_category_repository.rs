//! PostgreSQL-backed `CategoryRepository` implementation using Diesel.
//!
//! Deletion counts item and user references inside the delete transaction
//! so the referential-integrity refusal and the removal cannot race.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::category::{Category, CategoryDraft, CategoryId};
use crate::domain::ports::{
    CategoryDeleteOutcome, CategoryRepository, CategoryRepositoryError,
};

use super::diesel_helpers::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{CategoryRow, NewCategoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{categories, items, users};

/// Diesel-backed implementation of the category repository port.
#[derive(Clone)]
pub struct DieselCategoryRepository {
    pool: DbPool,
}

impl DieselCategoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> CategoryRepositoryError {
    map_pool_error(error, CategoryRepositoryError::connection)
}

fn map_db(error: diesel::result::Error) -> CategoryRepositoryError {
    map_diesel_error(
        error,
        CategoryRepositoryError::query,
        CategoryRepositoryError::connection,
    )
}

fn category_from_row(row: CategoryRow) -> Result<Category, CategoryRepositoryError> {
    let CategoryRow {
        id,
        name,
        description,
        created_at,
        updated_at,
    } = row;
    Category::new(
        CategoryId::new(id),
        CategoryDraft { name, description },
        created_at,
        updated_at,
    )
    .map_err(|err| CategoryRepositoryError::query(format!("stored category {id} failed validation: {err}")))
}

#[async_trait]
impl CategoryRepository for DieselCategoryRepository {
    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: CategoryRow = diesel::insert_into(categories::table)
            .values(NewCategoryRow {
                name: &draft.name,
                description: draft.description.as_deref(),
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    CategoryRepositoryError::duplicate_name(&draft.name)
                } else {
                    map_db(error)
                }
            })?;
        category_from_row(row)
    }

    async fn update(
        &self,
        category_id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: Option<CategoryRow> = diesel::update(categories::table.find(category_id.as_i64()))
            .set((
                categories::name.eq(&draft.name),
                categories::description.eq(draft.description.as_deref()),
            ))
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|error| {
                if is_unique_violation(&error) {
                    CategoryRepositoryError::duplicate_name(&draft.name)
                } else {
                    map_db(error)
                }
            })?;
        row.map(category_from_row).transpose()
    }

    async fn find_by_id(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = categories::table
            .find(category_id.as_i64())
            .select(CategoryRow::as_select())
            .first::<CategoryRow>(&mut conn)
            .await
            .optional()
            .map_err(map_db)?;
        row.map(category_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<CategoryRow> = categories::table
            .select(CategoryRow::as_select())
            .order(categories::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_db)?;
        rows.into_iter().map(category_from_row).collect()
    }

    async fn delete(
        &self,
        category_id: CategoryId,
    ) -> Result<CategoryDeleteOutcome, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        conn.transaction::<CategoryDeleteOutcome, diesel::result::Error, _>(|conn| {
            async move {
                let item_refs: i64 = items::table
                    .filter(items::category_id.eq(category_id.as_i64()))
                    .count()
                    .get_result(conn)
                    .await?;
                let user_refs: i64 = users::table
                    .filter(users::category_id.eq(category_id.as_i64()))
                    .count()
                    .get_result(conn)
                    .await?;
                if item_refs > 0 || user_refs > 0 {
                    return Ok(CategoryDeleteOutcome::Referenced {
                        items: item_refs,
                        users: user_refs,
                    });
                }
                let removed = diesel::delete(categories::table.find(category_id.as_i64()))
                    .execute(conn)
                    .await?;
                if removed == 0 {
                    Ok(CategoryDeleteOutcome::NotFound)
                } else {
                    Ok(CategoryDeleteOutcome::Deleted)
                }
            }
            .scope_boxed()
        })
        .await
        .map_err(map_db)
    }
}
