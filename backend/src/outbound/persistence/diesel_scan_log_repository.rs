//! PostgreSQL-backed `ScanLogRepository` implementation using Diesel.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::access::ListScope;
use crate::domain::item::ItemId;
use crate::domain::ports::{ScanLogFilter, ScanLogRepository, ScanLogRepositoryError};
use crate::domain::scan::{NewScanLogRecord, ScanAction, ScanLogEntry, ScanType};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{NewScanLogRow, ScanLogRow};
use super::pool::{DbPool, PoolError};
use super::schema::{items, scan_logs};

/// Cap for scan log reads when the caller does not set one.
const SCAN_LOG_LIMIT: i64 = 100;

/// Diesel-backed implementation of the scan log repository port.
#[derive(Clone)]
pub struct DieselScanLogRepository {
    pool: DbPool,
}

impl DieselScanLogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> ScanLogRepositoryError {
    map_pool_error(error, ScanLogRepositoryError::connection)
}

fn map_db(error: diesel::result::Error) -> ScanLogRepositoryError {
    map_diesel_error(
        error,
        ScanLogRepositoryError::query,
        ScanLogRepositoryError::connection,
    )
}

fn entry_from_row(row: ScanLogRow) -> Result<ScanLogEntry, ScanLogRepositoryError> {
    let ScanLogRow {
        id,
        item_id,
        article,
        scan_type,
        scan_data,
        action,
        result,
        scanned_by,
        created_at,
    } = row;
    let scan_type = ScanType::from_str(&scan_type)
        .map_err(|err| ScanLogRepositoryError::query(format!("stored scan log {id} is invalid: {err}")))?;
    let action = ScanAction::from_str(&action)
        .map_err(|err| ScanLogRepositoryError::query(format!("stored scan log {id} is invalid: {err}")))?;
    Ok(ScanLogEntry {
        id,
        item_id: ItemId::new(item_id),
        article,
        scan_type,
        scan_data,
        action,
        result,
        scanned_by,
        created_at,
    })
}

#[async_trait]
impl ScanLogRepository for DieselScanLogRepository {
    async fn record(
        &self,
        record: &NewScanLogRecord,
    ) -> Result<ScanLogEntry, ScanLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: ScanLogRow = diesel::insert_into(scan_logs::table)
            .values(NewScanLogRow {
                item_id: record.item_id.as_i64(),
                article: &record.article,
                scan_type: record.scan_type.as_str(),
                scan_data: &record.scan_data,
                action: record.action.as_str(),
                result: &record.result,
                scanned_by: &record.scanned_by,
            })
            .returning(ScanLogRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_db)?;
        entry_from_row(row)
    }

    async fn list(
        &self,
        scope: &ListScope,
        filter: &ScanLogFilter,
    ) -> Result<Vec<ScanLogEntry>, ScanLogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let mut query = scan_logs::table.inner_join(items::table).into_boxed();
        if let ListScope::Category(category) = scope {
            query = query.filter(items::category_id.eq(category.as_i64()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(scan_logs::created_at.ge(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(scan_logs::created_at.le(end));
        }
        if let Some(action) = filter.action {
            query = query.filter(scan_logs::action.eq(action.as_str()));
        }

        let rows: Vec<ScanLogRow> = query
            .select(ScanLogRow::as_select())
            .order(scan_logs::created_at.desc())
            .limit(filter.limit.unwrap_or(SCAN_LOG_LIMIT))
            .load(&mut conn)
            .await
            .map_err(map_db)?;
        rows.into_iter().map(entry_from_row).collect()
    }
}
