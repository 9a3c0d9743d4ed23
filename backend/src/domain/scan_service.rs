//! Scanner-driven flows: search, quick quantity update, and inventory
//! counting, each leaving a scan log record.
//!
//! Payload interpretation is delegated to the `scan-codes` crate so printed
//! labels resolve identically everywhere. The audit-critical atomic unit is
//! the item+history pair inside the ledger; scan log entries append after a
//! successful change, so a fault between the two can lose a scan log line
//! but never audit history.

use std::sync::Arc;

use tracing::{debug, warn};

use scan_codes::{ScanResolution, resolve};

use crate::domain::access;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::identity::IdentityContext;
use crate::domain::item::{Item, ItemId};
use crate::domain::ledger_service::{LedgerService, QtyChangeApplied, QtyUpdateRequest};
use crate::domain::ports::{
    ItemFilter, ItemRepository, ItemRepositoryError, ItemSort, ItemSortField, QtyHistoryRepository,
    ScanLogFilter, ScanLogRepository, ScanLogRepositoryError, SortDirection,
};
use crate::domain::scan::{NewScanLogRecord, ScanAction, ScanLogEntry, ScanType};

/// Matches returned to the scanner client are capped like any other lookup.
const SCAN_SEARCH_LIMIT: i64 = 10;

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

/// One scanned payload with the quantity counted on the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountScan {
    pub scan_data: String,
    pub counted_qty: i32,
}

/// Outcome of one inventory count scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountOutcome {
    /// The payload resolved and the count was logged.
    Counted {
        item_id: ItemId,
        article: String,
        system_qty: i32,
        counted_qty: i32,
    },
    /// The payload matched no visible item; the batch continues.
    Unresolved { scan_data: String },
}

/// A counted quantity that disagrees with the system quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountDiscrepancy {
    pub item_id: ItemId,
    pub article: String,
    pub system_qty: i32,
    pub counted_qty: i32,
    /// Counted minus system.
    pub difference: i32,
}

/// Result of an inventory count batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryCountOutcome {
    pub total_scanned: usize,
    pub results: Vec<CountOutcome>,
    pub discrepancies: Vec<CountDiscrepancy>,
}

/// Service owning the scanner-driven flows.
#[derive(Clone)]
pub struct ScanService<I, H, S> {
    items: Arc<I>,
    ledger: LedgerService<I, H>,
    scan_logs: Arc<S>,
}

impl<I, H, S> ScanService<I, H, S> {
    /// Create a new service over the item repository, ledger service, and
    /// scan log repository.
    pub fn new(items: Arc<I>, ledger: LedgerService<I, H>, scan_logs: Arc<S>) -> Self {
        Self {
            items,
            ledger,
            scan_logs,
        }
    }
}

impl<I, H, S> ScanService<I, H, S>
where
    I: ItemRepository,
    H: QtyHistoryRepository,
    S: ScanLogRepository,
{
    /// Resolve a scanned payload to matching items and log the lookup.
    ///
    /// A scan that matches nothing fails with `NotFound` and leaves no log
    /// entry; only successful lookups are recorded.
    pub async fn qr_search(
        &self,
        identity: &IdentityContext,
        scan_data: &str,
    ) -> DomainResult<Vec<Item>> {
        let matches = self.resolve_matches(identity, scan_data).await?;
        let Some(first) = matches.first() else {
            return Err(DomainError::not_found("no items matched the scanned code"));
        };
        self.scan_logs
            .record(&NewScanLogRecord {
                item_id: first.id(),
                article: first.article().to_owned(),
                scan_type: ScanType::Qr,
                scan_data: scan_data.to_owned(),
                action: ScanAction::Search,
                result: format!("Found {} items", matches.len()),
                scanned_by: identity.username.clone(),
            })
            .await
            .map_err(map_scan_log_error)?;
        Ok(matches)
    }

    /// Resolve a scanned payload to one item and apply a quantity change
    /// through the ledger's scanner entry point, then log the update.
    pub async fn qr_quick_update(
        &self,
        identity: &IdentityContext,
        scan_data: &str,
        request: QtyUpdateRequest,
    ) -> DomainResult<QtyChangeApplied> {
        let item = self
            .resolve_matches(identity, scan_data)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found("no items matched the scanned code"))?;

        let applied = self
            .ledger
            .apply_qr_update(identity, item.id(), request)
            .await?;

        // The quantity change is already committed; a scan log failure is
        // reported but does not undo it.
        if let Err(error) = self
            .scan_logs
            .record(&NewScanLogRecord {
                item_id: applied.item.id(),
                article: applied.item.article().to_owned(),
                scan_type: ScanType::Qr,
                scan_data: scan_data.to_owned(),
                action: ScanAction::Update,
                result: format!(
                    "Qty updated: {} → {}",
                    applied.history.old_qty(),
                    applied.history.new_qty()
                ),
                scanned_by: identity.username.clone(),
            })
            .await
        {
            warn!(item_id = %applied.item.id(), %error, "scan log append failed after update");
        }
        Ok(applied)
    }

    /// Reconcile a batch of counted quantities against system stock.
    ///
    /// Each scan resolves independently; unresolvable payloads are reported
    /// per entry and never abort the batch. Every resolved scan leaves a
    /// `check_in` log entry recording both quantities.
    pub async fn inventory_count(
        &self,
        identity: &IdentityContext,
        scans: Vec<CountScan>,
    ) -> DomainResult<InventoryCountOutcome> {
        let mut results = Vec::with_capacity(scans.len());
        let mut discrepancies = Vec::new();
        for scan in scans {
            let resolved = self
                .resolve_matches(identity, &scan.scan_data)
                .await?
                .into_iter()
                .next();
            let Some(item) = resolved else {
                debug!(scan_data = scan.scan_data.as_str(), "count scan matched nothing");
                results.push(CountOutcome::Unresolved {
                    scan_data: scan.scan_data,
                });
                continue;
            };

            if item.qty() != scan.counted_qty {
                discrepancies.push(CountDiscrepancy {
                    item_id: item.id(),
                    article: item.article().to_owned(),
                    system_qty: item.qty(),
                    counted_qty: scan.counted_qty,
                    difference: scan.counted_qty - item.qty(),
                });
            }
            if let Err(error) = self
                .scan_logs
                .record(&NewScanLogRecord {
                    item_id: item.id(),
                    article: item.article().to_owned(),
                    scan_type: ScanType::Qr,
                    scan_data: scan.scan_data.clone(),
                    action: ScanAction::CheckIn,
                    result: format!("Counted: {}, System: {}", scan.counted_qty, item.qty()),
                    scanned_by: identity.username.clone(),
                })
                .await
            {
                warn!(item_id = %item.id(), %error, "scan log append failed during count");
            }
            results.push(CountOutcome::Counted {
                item_id: item.id(),
                article: item.article().to_owned(),
                system_qty: item.qty(),
                counted_qty: scan.counted_qty,
            });
        }
        Ok(InventoryCountOutcome {
            total_scanned: results.len(),
            results,
            discrepancies,
        })
    }

    /// Scan log entries visible under the identity's scope, newest first.
    pub async fn list_scan_logs(
        &self,
        identity: &IdentityContext,
        filter: &ScanLogFilter,
    ) -> DomainResult<Vec<ScanLogEntry>> {
        let scope = access::list_scope(identity);
        self.scan_logs
            .list(&scope, filter)
            .await
            .map_err(map_scan_log_error)
    }

    /// Resolve a payload to the items the identity may see. An id hit
    /// outside the identity's scope reads as no match.
    async fn resolve_matches(
        &self,
        identity: &IdentityContext,
        scan_data: &str,
    ) -> DomainResult<Vec<Item>> {
        match resolve(scan_data) {
            ScanResolution::ItemId(id) => {
                let found = self
                    .items
                    .find_by_id(ItemId::new(id))
                    .await
                    .map_err(map_item_error)?;
                Ok(found
                    .into_iter()
                    .filter(|item| access::can_read(identity, item.category_id()))
                    .collect())
            }
            ScanResolution::SearchTerm(term) => {
                let scope = access::list_scope(identity);
                let page = self
                    .items
                    .list(
                        &scope,
                        &ItemFilter {
                            search: Some(term),
                            sort: Some(ItemSort {
                                field: ItemSortField::UpdatedAt,
                                direction: SortDirection::Desc,
                            }),
                            limit: Some(SCAN_SEARCH_LIMIT),
                            ..ItemFilter::default()
                        },
                    )
                    .await
                    .map_err(map_item_error)?;
                Ok(page.items)
            }
        }
    }
}

#[cfg(test)]
#[path = "scan_service_tests.rs"]
mod tests;
