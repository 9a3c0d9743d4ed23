//! Dashboard aggregation over items, history, and scan logs.

use std::sync::Arc;

use crate::domain::access;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::history::QtyHistoryEntry;
use crate::domain::identity::IdentityContext;
use crate::domain::ports::{
    DistinctFilterValues, HistoryFilter, ItemRepository, ItemRepositoryError,
    QtyHistoryRepository, QtyHistoryRepositoryError, ScanLogFilter, ScanLogRepository,
    ScanLogRepositoryError, StockSummary,
};
use crate::domain::scan::ScanLogEntry;

/// Entries shown in the dashboard's recent-activity panel.
const RECENT_ACTIVITY_LIMIT: i64 = 10;
/// Entries shown in the dashboard's recent-scans panel.
const RECENT_SCANS_LIMIT: i64 = 5;

fn map_item_error(error: ItemRepositoryError) -> DomainError {
    match error {
        ItemRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("item repository unavailable: {message}"))
        }
        ItemRepositoryError::Query { message } => {
            DomainError::internal(format!("item repository error: {message}"))
        }
    }
}

fn map_history_error(error: QtyHistoryRepositoryError) -> DomainError {
    match error {
        QtyHistoryRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("history repository unavailable: {message}"))
        }
        QtyHistoryRepositoryError::Query { message } => {
            DomainError::internal(format!("history repository error: {message}"))
        }
    }
}

fn map_scan_log_error(error: ScanLogRepositoryError) -> DomainError {
    match error {
        ScanLogRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("scan log repository unavailable: {message}"))
        }
        ScanLogRepositoryError::Query { message } => {
            DomainError::internal(format!("scan log repository error: {message}"))
        }
    }
}

/// Aggregated dashboard payload, scoped to the identity's category.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub summary: StockSummary,
    pub recent_activity: Vec<QtyHistoryEntry>,
    pub recent_scans: Vec<ScanLogEntry>,
}

/// Service assembling the dashboard and filter-dropdown reads.
#[derive(Clone)]
pub struct StatsService<I, H, S> {
    items: Arc<I>,
    history: Arc<H>,
    scan_logs: Arc<S>,
}

impl<I, H, S> StatsService<I, H, S> {
    /// Create a new service over the three read repositories.
    pub fn new(items: Arc<I>, history: Arc<H>, scan_logs: Arc<S>) -> Self {
        Self {
            items,
            history,
            scan_logs,
        }
    }
}

impl<I, H, S> StatsService<I, H, S>
where
    I: ItemRepository,
    H: QtyHistoryRepository,
    S: ScanLogRepository,
{
    /// Stock totals, per-location aggregation, and recent activity for the
    /// identity's visible items.
    pub async fn dashboard(&self, identity: &IdentityContext) -> DomainResult<DashboardStats> {
        let scope = access::list_scope(identity);
        let summary = self
            .items
            .stats(&scope)
            .await
            .map_err(map_item_error)?;
        let recent_activity = self
            .history
            .list_all(
                &scope,
                &HistoryFilter {
                    limit: Some(RECENT_ACTIVITY_LIMIT),
                    ..HistoryFilter::default()
                },
            )
            .await
            .map_err(map_history_error)?;
        let recent_scans = self
            .scan_logs
            .list(
                &scope,
                &ScanLogFilter {
                    limit: Some(RECENT_SCANS_LIMIT),
                    ..ScanLogFilter::default()
                },
            )
            .await
            .map_err(map_scan_log_error)?;
        Ok(DashboardStats {
            summary,
            recent_activity,
            recent_scans,
        })
    }

    /// Distinct komponen and location codes for filter dropdowns.
    pub async fn distinct_values(
        &self,
        identity: &IdentityContext,
    ) -> DomainResult<DistinctFilterValues> {
        let scope = access::list_scope(identity);
        self.items
            .distinct_values(&scope)
            .await
            .map_err(map_item_error)
    }
}

#[cfg(test)]
#[path = "stats_service_tests.rs"]
mod tests;
