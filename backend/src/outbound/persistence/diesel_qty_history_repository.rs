//! PostgreSQL-backed `QtyHistoryRepository` implementation using Diesel.
//!
//! Read-only: history rows are written by the item repository inside the
//! quantity-change transactions.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::access::ListScope;
use crate::domain::history::QtyHistoryEntry;
use crate::domain::item::ItemId;
use crate::domain::ports::{HistoryFilter, QtyHistoryRepository, QtyHistoryRepositoryError};

use super::diesel_helpers::{history_from_row, map_diesel_error, map_pool_error};
use super::models::QtyHistoryRow;
use super::pool::{DbPool, PoolError};
use super::schema::{items, qty_history};

/// Cap for per-item history reads when the caller does not set one.
const ITEM_HISTORY_LIMIT: i64 = 50;
/// Cap for cross-item history reads when the caller does not set one.
const ALL_HISTORY_LIMIT: i64 = 100;

/// Diesel-backed implementation of the history repository port.
#[derive(Clone)]
pub struct DieselQtyHistoryRepository {
    pool: DbPool,
}

impl DieselQtyHistoryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> QtyHistoryRepositoryError {
    map_pool_error(error, QtyHistoryRepositoryError::connection)
}

fn map_db(error: diesel::result::Error) -> QtyHistoryRepositoryError {
    map_diesel_error(
        error,
        QtyHistoryRepositoryError::query,
        QtyHistoryRepositoryError::connection,
    )
}

fn rows_to_entries(
    rows: Vec<QtyHistoryRow>,
) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
    rows.into_iter()
        .map(|row| history_from_row(row, QtyHistoryRepositoryError::query))
        .collect()
}

#[async_trait]
impl QtyHistoryRepository for DieselQtyHistoryRepository {
    async fn list_for_item(
        &self,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = qty_history::table
            .filter(qty_history::item_id.eq(item_id.as_i64()))
            .into_boxed();
        if let Some(start) = filter.start_date {
            query = query.filter(qty_history::created_at.ge(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(qty_history::created_at.le(end));
        }
        if let Some(change_type) = filter.change_type {
            query = query.filter(qty_history::change_type.eq(change_type.as_str()));
        }

        let rows: Vec<QtyHistoryRow> = query
            .select(QtyHistoryRow::as_select())
            .order(qty_history::created_at.desc())
            .limit(filter.limit.unwrap_or(ITEM_HISTORY_LIMIT))
            .load(&mut conn)
            .await
            .map_err(map_db)?;
        rows_to_entries(rows)
    }

    async fn list_all(
        &self,
        scope: &ListScope,
        filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = qty_history::table.inner_join(items::table).into_boxed();
        if let ListScope::Category(category) = scope {
            query = query.filter(items::category_id.eq(category.as_i64()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(qty_history::created_at.ge(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(qty_history::created_at.le(end));
        }
        if let Some(change_type) = filter.change_type {
            query = query.filter(qty_history::change_type.eq(change_type.as_str()));
        }

        let rows: Vec<QtyHistoryRow> = query
            .select(QtyHistoryRow::as_select())
            .order(qty_history::created_at.desc())
            .limit(filter.limit.unwrap_or(ALL_HISTORY_LIMIT))
            .load(&mut conn)
            .await
            .map_err(map_db)?;
        rows_to_entries(rows)
    }
}
